//! strongbox: command-line front end for strongbox-crypto
//!
//! Commands:
//!   derive-key --salt <salt>           - PBKDF2 key from a password (prompted or $STRONGBOX_PASSWORD)
//!   keygen --out <dir> [--bits N]      - write public.pem / private.pem
//!   random <length>                    - random bytes as hex
//!   encrypt --key <hex> [<file>]       - seal a file (binary) or stdin (text) into an envelope
//!   decrypt --key <hex> [<file>]       - open an envelope from a file or stdin
//!   seal --public-key <pem> <text>     - RSA-OAEP encrypt
//!   open --private-key <pem> <hex>     - RSA-OAEP decrypt
//!   digest [<file>]                    - SHA-256 of text
//!   config show                        - display effective configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info};

use strongbox_crypto::{Codec, CodecConfig};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "strongbox",
    version,
    about = "Client-side encryption codec",
    long_about = "strongbox: derive keys, seal and open AES-CBC envelopes, RSA-OAEP encrypt short strings, and digest text"
)]
struct Cli {
    /// Path to strongbox.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "STRONGBOX_CONFIG",
        default_value = "/etc/strongbox/config.toml"
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "STRONGBOX_LOG", default_value = "warn")]
    log: String,

    /// Log format (json, text)
    #[arg(long, env = "STRONGBOX_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Derive a 256-bit hex key from a password and salt
    #[command(name = "derive-key")]
    DeriveKey {
        /// Salt (stored alongside whatever the key protects; not secret)
        #[arg(long)]
        salt: String,
        /// Password (prompted without echo when unset)
        #[arg(long, env = "STRONGBOX_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Generate an RSA key pair as PEM files
    Keygen {
        /// Output directory for public.pem and private.pem
        #[arg(long, short = 'o')]
        out: PathBuf,
        /// Modulus size in bits (default: config key_bits)
        #[arg(long)]
        bits: Option<usize>,
    },

    /// Print random bytes as hex
    Random {
        /// Number of bytes
        length: usize,
    },

    /// Encrypt into an AES-CBC envelope
    ///
    /// A file argument is encrypted as raw bytes. Without one, stdin is read
    /// as UTF-8 text.
    Encrypt {
        /// 64-character hex key
        #[arg(long, short = 'k', env = "STRONGBOX_KEY", hide_env_values = true)]
        key: String,
        /// Encrypt text as-is instead of UTF-8 → base64 pre-encoding
        #[arg(long)]
        raw: bool,
        /// Units fed to the cipher per step (default: config chunk_size)
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Input file (default: stdin text)
        input: Option<PathBuf>,
    },

    /// Decrypt an AES-CBC envelope
    Decrypt {
        /// 64-character hex key
        #[arg(long, short = 'k', env = "STRONGBOX_KEY", hide_env_values = true)]
        key: String,
        /// Plaintext was encrypted with --raw
        #[arg(long)]
        raw: bool,
        /// Write the decrypted bytes unmodified (for files encrypted as binary)
        #[arg(long, conflicts_with = "raw")]
        binary: bool,
        /// Bytes fed to the decipher per step (default: config chunk_size)
        #[arg(long)]
        chunk_size: Option<usize>,
        /// File containing the envelope (default: stdin)
        envelope: Option<PathBuf>,
    },

    /// Encrypt a short string to an RSA public key
    Seal {
        /// PEM public key file
        #[arg(long)]
        public_key: PathBuf,
        /// Text to encrypt
        text: String,
    },

    /// Decrypt hex ciphertext with an RSA private key
    Open {
        /// PEM private key file
        #[arg(long)]
        private_key: PathBuf,
        /// Hex ciphertext from `seal`
        ciphertext: String,
    },

    /// SHA-256 digest of text
    Digest {
        /// Units fed to the hash per step (default: config chunk_size)
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Input file (default: stdin)
        input: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log, &cli.log_format);

    let config = load_config(&cli.config).await?;
    let codec = Codec::new(config).context("invalid configuration")?;
    debug!(config = ?codec.config(), "codec ready");

    match cli.command {
        Commands::DeriveKey { salt, password } => cmd_derive_key(&codec, &salt, password).await,
        Commands::Keygen { out, bits } => cmd_keygen(&codec, &out, bits).await,
        Commands::Random { length } => {
            println!("{}", codec.random_bytes(length).await?);
            Ok(())
        }
        Commands::Encrypt { key, raw, chunk_size, input } => {
            cmd_encrypt(&codec, &key, raw, chunk_size, input.as_deref()).await
        }
        Commands::Decrypt { key, raw, binary, chunk_size, envelope } => {
            cmd_decrypt(&codec, &key, raw, binary, chunk_size, envelope.as_deref()).await
        }
        Commands::Seal { public_key, text } => {
            let pem = read_text(Some(&public_key)).await?;
            println!("{}", codec.asymmetric_encrypt(&text, &pem).await?);
            Ok(())
        }
        Commands::Open { private_key, ciphertext } => {
            let pem = read_text(Some(&private_key)).await?;
            println!("{}", codec.asymmetric_decrypt(&ciphertext, &pem).await?);
            Ok(())
        }
        Commands::Digest { chunk_size, input } => {
            let text = read_text(input.as_deref()).await?;
            println!("{}", codec.digest(&text, chunk_size).await?);
            Ok(())
        }
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(codec.config(), &cli.config),
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries command output; logs go to stderr
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

async fn load_config(path: &Path) -> Result<CodecConfig> {
    if path.exists() {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading config: {}", path.display()))?;
        CodecConfig::from_toml_str(&content)
            .with_context(|| format!("parsing config: {}", path.display()))
    } else {
        tracing::warn!(
            "config file not found: {}  (using defaults)",
            path.display()
        );
        Ok(CodecConfig::default())
    }
}

/// Read a UTF-8 file, or all of stdin when `path` is `None`.
async fn read_text(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("reading stdin")?;
            Ok(text)
        }
    }
}

// ── `strongbox derive-key` ────────────────────────────────────────────────────

async fn cmd_derive_key(codec: &Codec, salt: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => SecretString::from(password),
        None => SecretString::from(
            rpassword::prompt_password("Password: ").context("reading password")?,
        ),
    };
    println!("{}", codec.derive_key(&password, salt).await?);
    Ok(())
}

// ── `strongbox keygen` ────────────────────────────────────────────────────────

async fn cmd_keygen(codec: &Codec, out: &Path, bits: Option<usize>) -> Result<()> {
    let pair = codec.generate_key_pair(bits).await?;

    tokio::fs::create_dir_all(out)
        .await
        .with_context(|| format!("creating {}", out.display()))?;

    let public_path = out.join("public.pem");
    let private_path = out.join("private.pem");
    tokio::fs::write(&public_path, format!("{}\n", pair.public_key))
        .await
        .with_context(|| format!("writing {}", public_path.display()))?;
    write_private(&private_path, &pair.private_key).await?;

    info!(
        public = %public_path.display(),
        private = %private_path.display(),
        "key pair written"
    );
    println!("{}", public_path.display());
    println!("{}", private_path.display());
    Ok(())
}

/// Write a private key readable only by the owner.
async fn write_private(path: &Path, pem: &str) -> Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options
        .open(path)
        .await
        .with_context(|| format!("creating {}", path.display()))?;
    file.write_all(pem.as_bytes()).await?;
    file.write_all(b"\n").await?;
    file.flush().await?;
    Ok(())
}

// ── `strongbox encrypt` / `strongbox decrypt` ─────────────────────────────────

async fn cmd_encrypt(
    codec: &Codec,
    key: &str,
    raw: bool,
    chunk_size: Option<usize>,
    input: Option<&Path>,
) -> Result<()> {
    let envelope = match input {
        Some(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            codec.encrypt(&bytes, key, !raw, chunk_size).await?
        }
        None => {
            let text = read_text(None).await?;
            codec.encrypt(&text, key, !raw, chunk_size).await?
        }
    };
    println!("{envelope}");
    Ok(())
}

async fn cmd_decrypt(
    codec: &Codec,
    key: &str,
    raw: bool,
    binary: bool,
    chunk_size: Option<usize>,
    envelope: Option<&Path>,
) -> Result<()> {
    let envelope = read_text(envelope).await?;
    let envelope = envelope.trim();

    let mut stdout = tokio::io::stdout();
    if binary {
        let bytes = codec.decrypt_binary(envelope, key, chunk_size).await?;
        stdout.write_all(&bytes).await?;
    } else {
        let text = codec.decrypt(envelope, key, !raw, chunk_size).await?;
        stdout.write_all(text.as_bytes()).await?;
    }
    stdout.flush().await?;
    Ok(())
}

// ── `strongbox config show` ───────────────────────────────────────────────────

fn cmd_config_show(config: &CodecConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}
