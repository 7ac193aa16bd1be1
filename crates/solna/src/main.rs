#![forbid(unsafe_code)]

//! Solna CLI — XML Encryption operations (encrypt, decrypt).

use clap::{Parser, Subcommand};
use solna_core::Error;
use solna_enc::{EncContext, EncResult, Target};
use solna_keys::{loader, KeysManager};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(
    name = "solna",
    about = "Solna — Pure Rust XML Encryption (XML-Enc)",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct KeyArgs {
    /// Load a raw AES key (binary file, 16/24/32 bytes)
    #[arg(long = "aes-key")]
    aes_key: Option<PathBuf>,

    /// Load a raw 3DES key (binary file, 24 bytes)
    #[arg(long = "des3-key")]
    des3_key: Option<PathBuf>,

    /// Load an RSA private key (PEM)
    #[arg(short = 'k', long = "rsa-key")]
    rsa_key: Option<PathBuf>,

    /// Load a raw AES key with a name (NAME:FILE)
    #[arg(short = 'K', long = "key-name")]
    key_name: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt data into an EncryptedData template
    Encrypt {
        /// Template XML file (with an EncryptedData element)
        template: PathBuf,

        /// Encrypt the contents of this file
        #[arg(long, conflicts_with_all = ["uri", "document"])]
        data: Option<PathBuf>,

        /// Encrypt the bytes behind this URI
        #[arg(long, conflicts_with = "document")]
        uri: Option<String>,

        /// Encrypt a node of this XML document
        #[arg(long, requires = "node")]
        document: Option<PathBuf>,

        /// The node to encrypt: "#id" or an element local name
        #[arg(long)]
        node: Option<String>,

        #[command(flatten)]
        keys: KeyArgs,

        /// Register additional ID attribute names
        #[arg(long = "id-attr")]
        id_attr: Vec<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the result record to stderr
        #[arg(short, long)]
        verbose: bool,
    },

    /// Decrypt an encrypted XML document
    Decrypt {
        /// Input encrypted XML file
        file: PathBuf,

        #[command(flatten)]
        keys: KeyArgs,

        /// Register additional ID attribute names
        #[arg(long = "id-attr")]
        id_attr: Vec<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the result record to stderr
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("solna: {err}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    match cli.command {
        Commands::Encrypt {
            template,
            data,
            uri,
            document,
            node,
            keys,
            id_attr,
            output,
            verbose,
        } => {
            let ctx = build_context(&keys, &id_attr)?;
            let template_xml = read_text(&template)?;

            let result = if let Some(path) = data {
                let bytes = std::fs::read(&path)?;
                solna_enc::encrypt_memory(&ctx, None, &template_xml, &bytes)?
            } else if let Some(uri) = uri {
                solna_enc::encrypt_uri(&ctx, None, &template_xml, &uri)?
            } else if let Some(path) = document {
                let node = node.expect("clap enforces --node with --document");
                let doc_xml = read_text(&path)?;
                let target = match node.strip_prefix('#') {
                    Some(id) => Target::Id(id),
                    None => Target::Element {
                        ns: None,
                        local: &node,
                    },
                };
                solna_enc::encrypt_xml_node(&ctx, None, &doc_xml, target, &template_xml)?
            } else {
                return Err(Error::InvalidData(
                    "one of --data, --uri or --document is required".into(),
                ));
            };

            if verbose {
                result.dump(&mut std::io::stderr()).map_err(Error::Io)?;
            }
            write_output(output.as_deref(), result.document.as_bytes())
        }

        Commands::Decrypt {
            file,
            keys,
            id_attr,
            output,
            verbose,
        } => {
            let ctx = build_context(&keys, &id_attr)?;
            let xml = read_text(&file)?;
            let result = solna_enc::decrypt(&ctx, None, &xml)?;

            if verbose {
                result.dump(&mut std::io::stderr()).map_err(Error::Io)?;
            }
            let payload = decrypt_output(&result);
            write_output(output.as_deref(), payload)
        }
    }
}

/// A replaced document is printed whole; opaque plaintext is printed
/// as-is.
fn decrypt_output(result: &EncResult) -> &[u8] {
    if result.replaced {
        result.document.as_bytes()
    } else {
        result.buffer.as_deref().unwrap_or_default()
    }
}

fn build_context(keys: &KeyArgs, id_attrs: &[String]) -> Result<EncContext, Error> {
    let mut manager = KeysManager::new();

    if let Some(path) = &keys.aes_key {
        manager.add_key(loader::load_aes(&std::fs::read(path)?)?);
    }
    if let Some(path) = &keys.des3_key {
        manager.add_key(loader::load_des3(&std::fs::read(path)?)?);
    }
    if let Some(path) = &keys.rsa_key {
        manager.add_key(loader::load_rsa_private_pem(&std::fs::read(path)?)?);
    }
    for entry in &keys.key_name {
        let (name, path) = entry.split_once(':').ok_or_else(|| {
            Error::Key(format!("--key-name expects NAME:FILE, got \"{entry}\""))
        })?;
        let key = loader::load_aes(&std::fs::read(path)?)?;
        manager.add_key(key.with_name(name));
    }

    let mut ctx = EncContext::new(manager);
    for name in id_attrs {
        ctx.add_id_attr(name);
    }
    Ok(ctx)
}

fn read_text(path: &std::path::Path) -> Result<String, Error> {
    let bytes = std::fs::read(path)?;
    String::from_utf8(bytes).map_err(|e| Error::XmlParse(format!("{}: {e}", path.display())))
}

fn write_output(path: Option<&std::path::Path>, data: &[u8]) -> Result<(), Error> {
    use std::io::Write;
    match path {
        Some(path) => std::fs::write(path, data).map_err(Error::Io),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(data).map_err(Error::Io)?;
            stdout.write_all(b"\n").map_err(Error::Io)
        }
    }
}
