use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use idf_auth::{generate_signing_key, signing_key_from_hex, TokenIssuer};
use idf_server::{logging, ConfigError, LogFormat, ServerConfig};
use std::path::PathBuf;

fn cli() -> Command {
    Command::new("identifire")
        .version(idf_server::VERSION)
        .about("Identifire workspace backend")
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("serve")
                .about("Run the HTTP server")
                .arg(
                    Arg::new("host")
                        .long("host")
                        .help("Address to listen on"),
                )
                .arg(
                    Arg::new("port")
                        .long("port")
                        .value_parser(value_parser!(u16))
                        .help("Port to listen on (overrides PORT)"),
                )
                .arg(
                    Arg::new("static-dir")
                        .long("static-dir")
                        .value_parser(value_parser!(PathBuf))
                        .help("Frontend build directory served for non-API paths"),
                )
                .arg(
                    Arg::new("log-format")
                        .long("log-format")
                        .value_parser(value_parser!(LogFormat))
                        .help("Log output format"),
                )
                .arg(
                    Arg::new("in-memory")
                        .long("in-memory")
                        .action(ArgAction::SetTrue)
                        .help("Keep data in memory instead of PostgreSQL"),
                ),
        )
        .subcommand(
            Command::new("keygen")
                .about("Generate an identity signing key pair")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("issue-token")
                .about("Sign an identity token for local development")
                .arg(
                    Arg::new("signing-key")
                        .long("signing-key")
                        .env("AUTH_SIGNING_KEY")
                        .required(true)
                        .help("Hex ed25519 signing key"),
                )
                .arg(
                    Arg::new("email")
                        .long("email")
                        .required(true)
                        .help("Email the token names"),
                )
                .arg(
                    Arg::new("ttl")
                        .long("ttl")
                        .default_value("3600")
                        .value_parser(value_parser!(u64).range(1..))
                        .help("Seconds until the token expires"),
                ),
        )
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<ServerConfig> {
    let path = matches.get_one::<PathBuf>("config");
    Ok(ServerConfig::load(path.map(PathBuf::as_path))?.with_process_env()?)
}

fn apply_serve_flags(mut config: ServerConfig, args: &ArgMatches) -> ServerConfig {
    if let Some(host) = args.get_one::<String>("host") {
        config = config.with_host(host.clone());
    }
    if let Some(port) = args.get_one::<u16>("port") {
        config = config.with_port(*port);
    }
    if let Some(dir) = args.get_one::<PathBuf>("static-dir") {
        config = config.with_static_dir(dir.clone());
    }
    if let Some(format) = args.get_one::<LogFormat>("log-format") {
        config = config.with_log_format(*format);
    }
    if args.get_flag("in-memory") {
        config = config.with_in_memory(true);
    }
    config
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("serve", args)) => {
            let config = apply_serve_flags(config, args);
            logging::init(config.log_format)?;
            idf_server::serve(config).await
        }
        Some(("keygen", args)) => {
            let key = generate_signing_key();
            let signing = hex::encode(key.to_bytes());
            let public = hex::encode(key.verifying_key().to_bytes());

            if args.get_flag("json") {
                let out = serde_json::json!({ "signingKey": signing, "publicKey": public });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("AUTH_SIGNING_KEY={signing}");
                println!("AUTH_PUBLIC_KEY={public}");
            }
            Ok(())
        }
        Some(("issue-token", args)) => {
            let signing = args
                .get_one::<String>("signing-key")
                .ok_or_else(|| anyhow::anyhow!("--signing-key is required"))?;
            let email = args
                .get_one::<String>("email")
                .ok_or_else(|| anyhow::anyhow!("--email is required"))?;
            let ttl = args.get_one::<u64>("ttl").copied().unwrap_or(3600);

            let identity = &config.identity;
            let iss = identity.issuer.as_deref().ok_or(ConfigError::MissingIssuer)?;
            let aud = identity.audience.as_deref().ok_or(ConfigError::MissingAudience)?;
            let mut issuer = TokenIssuer::new(signing_key_from_hex(signing)?, iss, aud)
                .with_expiry(ttl);
            if let Some(namespace) = identity.namespace.as_deref() {
                issuer = issuer.with_namespace(namespace);
            }

            println!("{}", issuer.issue(email)?.encode());
            Ok(())
        }
        _ => Ok(()),
    }
}
