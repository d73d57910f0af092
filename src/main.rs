//! Zyora - virtual try-on from the terminal
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use zyora::identity::{self, GOOGLE_PROVIDER};
use zyora::images;
use zyora::models::ProfileEdit;
use zyora::{
    ApiClient, AppStore, Config, CredentialStore, GoogleIdentity, ImageAsset, ImageKind, Session,
    SqliteStore, Storage,
};

/// Redirect target registered for the implicit-grant flow
const OAUTH_REDIRECT_URI: &str = "http://localhost";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (RUST_LOG=debug for verbose output)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let command = parse_args()?;
    match command {
        Command::Help => {
            print_help();
            return Ok(());
        }
        Command::Version => {
            print_version();
            return Ok(());
        }
        _ => {}
    }

    let config = Config::load()?;
    match command {
        Command::Health => health_cli(&config).await,
        Command::Fetch { url } => fetch_cli(&config, &url).await,
        command => {
            let mut store = open_store(&config).await?;
            let result = run_with_store(&mut store, &config, command).await;

            store.flush().await;
            let failures = store.persist_failures();
            if failures > 0 {
                eprintln!("⚠ {} change(s) could not be saved to local storage", failures);
            }
            result
        }
    }
}

/// CLI commands
enum Command {
    Summary,
    LoginDev,
    LoginGoogle,
    Logout,
    WhoAmI,
    Generate {
        subject: String,
        garment: String,
        out: Option<PathBuf>,
    },
    Fetch {
        url: String,
    },
    Looks,
    LooksRemove {
        id: String,
    },
    LooksSave {
        id: String,
        dir: Option<PathBuf>,
    },
    Profile(ProfileEdit),
    Clear,
    Health,
    Help,
    Version,
}

fn flag_value(args: &[String], names: &[&str]) -> Option<String> {
    args.iter()
        .position(|a| names.contains(&a.as_str()))
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_args() -> Result<Command> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() == 1 {
        return Ok(Command::Summary);
    }

    match args[1].as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "-v" | "--version" | "version" => Ok(Command::Version),

        "login" => match args.get(2).map(String::as_str) {
            Some("--dev" | "dev") => Ok(Command::LoginDev),
            Some("google") => Ok(Command::LoginGoogle),
            Some(other) => bail!("Unknown sign-in method: {other}\nSupported: --dev, google"),
            None => bail!("Missing sign-in method\nExample: zyora login --dev"),
        },

        "logout" => Ok(Command::Logout),
        "whoami" => Ok(Command::WhoAmI),

        "generate" | "gen" => {
            let subject = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("Missing subject image"))?
                .clone();
            let garment = args
                .get(3)
                .ok_or_else(|| anyhow::anyhow!("Missing garment image"))?
                .clone();
            let out = flag_value(&args, &["--out", "-o"]).map(PathBuf::from);
            Ok(Command::Generate {
                subject,
                garment,
                out,
            })
        }

        "fetch" => {
            let url = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("Missing image URL"))?
                .clone();
            Ok(Command::Fetch { url })
        }

        "looks" => match args.get(2).map(String::as_str) {
            None => Ok(Command::Looks),
            Some("rm" | "remove") => {
                let id = args
                    .get(3)
                    .ok_or_else(|| anyhow::anyhow!("Missing look id"))?
                    .clone();
                Ok(Command::LooksRemove { id })
            }
            Some("save") => {
                let id = args
                    .get(3)
                    .ok_or_else(|| anyhow::anyhow!("Missing look id"))?
                    .clone();
                let dir = args.get(4).map(PathBuf::from);
                Ok(Command::LooksSave { id, dir })
            }
            Some(other) => bail!("Unknown looks command: {other}"),
        },

        "profile" => Ok(Command::Profile(ProfileEdit {
            display_name: flag_value(&args, &["--name", "-n"]),
            email: flag_value(&args, &["--email", "-e"]),
            photo_url: flag_value(&args, &["--photo", "-p"]),
        })),

        "clear" => Ok(Command::Clear),
        "health" => Ok(Command::Health),

        other => Err(anyhow::anyhow!(
            "Unknown command: {other}\nRun 'zyora --help' for usage"
        )),
    }
}

fn print_help() {
    let config_path = Config::default_path()
        .map_or_else(|_| "Unknown".to_string(), |p| p.display().to_string());

    println!(
        r#"{}
👗 Zyora - virtual try-on from your terminal

USAGE:
    zyora                              Show session summary
    zyora [COMMAND]

COMMANDS:
    login --dev                        Start a local developer session
    login google                       Sign in with Google
    logout                             Sign out
    whoami                             Show profile and quota

    generate <subject> <garment> [OPTIONS]
                                       Generate a look
      Options:
        -o, --out <dir>                Where to write the PNG
      Examples:
        zyora generate me.jpg jacket.png
        zyora generate me.jpg https://shop.example.com/jacket.jpg --out looks/

    fetch <url>                        Fetch an image through the backend

    looks                              List saved looks
    looks rm <id>                      Remove a saved look
    looks save <id> [dir]              Write a saved look to a PNG file

    profile [OPTIONS]                  Show or edit your profile
      Options:
        -n, --name <name>              Display name
        -e, --email <email>            Email address
        -p, --photo <uri>              Profile photo

    clear                              Clear all local data
    health                             Check the backend

OPTIONS:
    -h, --help                         Show this help message
    -v, --version                      Show version information

ENVIRONMENT:
    ZYORA_API_BASE_URL                 Override the backend URL
    RUST_LOG                           Log filter (default: warn)

CONFIG:
    {}
"#,
        zyora::LOGO,
        config_path
    );
}

fn print_version() {
    println!("zyora {}", zyora::VERSION);
}

async fn open_store(config: &Config) -> Result<AppStore> {
    let kv = SqliteStore::open().context("Failed to open local storage")?;
    let identity = GoogleIdentity::new(&config.google_client_id, CredentialStore::open()?);

    let mut store = AppStore::new(
        Storage::new(Arc::new(kv)),
        Arc::new(identity),
        config.max_free_quota,
    );
    store.load_from_storage().await;
    Ok(store)
}

async fn run_with_store(store: &mut AppStore, config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Summary => {
            print_summary(store);
            Ok(())
        }
        Command::LoginDev => {
            store.sign_in_as_developer().await;
            println!("✓ Signed in as developer");
            Ok(())
        }
        Command::LoginGoogle => login_google(store, config).await,
        Command::Logout => {
            store.sign_out().await;
            println!("✓ Signed out");
            Ok(())
        }
        Command::WhoAmI => whoami(store),
        Command::Generate {
            subject,
            garment,
            out,
        } => generate_cli(store, config, &subject, &garment, out).await,
        Command::Looks => {
            list_looks(store);
            Ok(())
        }
        Command::LooksRemove { id } => {
            if store.state().saved_look(&id).is_none() {
                bail!("No saved look with id {id}");
            }
            store.remove_saved_look(&id);
            println!("✓ Removed look {id}");
            Ok(())
        }
        Command::LooksSave { id, dir } => {
            let look = store
                .state()
                .saved_look(&id)
                .ok_or_else(|| anyhow::anyhow!("No saved look with id {id}"))?;
            let dir = output_dir(config, dir);
            let path = zyora::generate::save_look_image(&look.image, &dir)?;
            println!("✓ Saved {}", path.display());
            Ok(())
        }
        Command::Profile(edit) => profile_cli(store, edit),
        Command::Clear => {
            store.clear_all_data();
            println!("✓ All local data cleared");
            Ok(())
        }
        Command::Health | Command::Fetch { .. } | Command::Help | Command::Version => Ok(()),
    }
}

fn print_summary(store: &AppStore) {
    let state = store.state();
    match (state.session(), &state.user) {
        (Session::SignedIn, Some(user)) => {
            let mode = if state.is_dev_mode { " (developer)" } else { "" };
            println!(
                "👤 {}{}",
                user.display_name.as_deref().unwrap_or("Anonymous"),
                mode
            );
            println!(
                "   {} of {} looks left · {} saved",
                user.remaining(),
                user.max_quota,
                state.saved_looks.len()
            );
        }
        _ => {
            println!("Not signed in.");
            println!("\nSign in with:");
            println!("  zyora login --dev");
            println!("  zyora login google");
        }
    }
}

fn whoami(store: &AppStore) -> Result<()> {
    let user = store
        .state()
        .user
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Not signed in. Run: zyora login --dev"))?;

    println!("{}", user.display_name.as_deref().unwrap_or("Anonymous"));
    println!("{}", "─".repeat(40));
    println!("  Id:      {}", user.uid);
    if let Some(email) = &user.email {
        println!("  Email:   {}", email);
    }
    if let Some(photo) = &user.photo_url {
        println!("  Photo:   {}", photo);
    }
    println!(
        "  Quota:   {}/{} used ({}%)",
        user.quota,
        user.max_quota,
        user.usage_percent()
    );
    if store.state().is_dev_mode {
        println!("  Mode:    developer");
    }
    Ok(())
}

async fn login_google(store: &mut AppStore, config: &Config) -> Result<()> {
    let auth_url = identity::authorization_url(&config.google_client_id, OAUTH_REDIRECT_URI);

    println!("🔑 Signing in with Google...");
    println!("\n📋 Open this URL in your browser:\n\n  {}\n", auth_url);

    // Try to open browser
    let _ = open::that(&auth_url);

    println!("After approving, copy the access_token from the redirect URL and paste it here:");
    let mut token = String::new();
    std::io::stdin().read_line(&mut token)?;
    let token = token.trim();

    store
        .sign_in_with_provider(token)
        .await
        .context("Google sign-in failed")?;

    let api = ApiClient::from_config(config)?;
    if api.exchange_token(token).await.is_some() {
        tracing::debug!("Backend accepted the {GOOGLE_PROVIDER} token");
    }

    if let Some(user) = &store.state().user {
        println!(
            "\n✓ Signed in as {}",
            user.display_name
                .as_deref()
                .or(user.email.as_deref())
                .unwrap_or(user.uid.as_str())
        );
    }
    Ok(())
}

fn output_dir(config: &Config, dir: Option<PathBuf>) -> PathBuf {
    dir.or_else(|| config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."))
}

async fn stage_image(
    api: &ApiClient,
    config: &Config,
    source: &str,
    kind: ImageKind,
) -> Result<ImageAsset> {
    if images::is_valid_image_url(source) {
        let uri = api
            .fetch_image_from_url(source)
            .await
            .ok_or_else(|| anyhow::anyhow!("Could not fetch image from {source}"))?;
        return Ok(ImageAsset::from_data_uri(uri, kind));
    }

    ImageAsset::from_path(Path::new(source), kind, config.max_image_bytes())
}

async fn generate_cli(
    store: &mut AppStore,
    config: &Config,
    subject: &str,
    garment: &str,
    out: Option<PathBuf>,
) -> Result<()> {
    if store.state().session() == Session::SignedOut {
        bail!("Not signed in. Run: zyora login --dev");
    }

    let api = ApiClient::from_config(config)?;

    let user_img = stage_image(&api, config, subject, ImageKind::User).await?;
    let fit_img = stage_image(&api, config, garment, ImageKind::Fit).await?;
    store.set_user_img(Some(user_img));
    store.set_fit_img(Some(fit_img));

    println!("✨ Generating your look...");
    let look = zyora::generate::run(store, &api).await?;

    let path = zyora::generate::save_look_image(&look.image, &output_dir(config, out))?;
    println!("✓ Look {} saved to {}", look.id, path.display());

    if let Some(remaining) = store.state().quota_remaining() {
        println!("  {} looks left", remaining);
    }
    Ok(())
}

async fn fetch_cli(config: &Config, url: &str) -> Result<()> {
    if !images::is_valid_image_url(url) {
        bail!("Not an http(s) URL: {url}");
    }

    let api = ApiClient::from_config(config)?;
    let uri = api
        .fetch_image_from_url(url)
        .await
        .ok_or_else(|| anyhow::anyhow!("Could not fetch image from {url}"))?;

    let (mime, bytes) = images::decode_data_uri(&uri)?;
    println!("✓ Fetched {} ({} bytes)", mime, bytes.len());
    Ok(())
}

async fn health_cli(config: &Config) -> Result<()> {
    let api = ApiClient::from_config(config)?;
    if api.check_health().await {
        println!("✓ {} is healthy", api.base_url());
        Ok(())
    } else {
        bail!("{} is not responding", api.base_url())
    }
}

fn list_looks(store: &AppStore) {
    let looks = &store.state().saved_looks;

    if looks.is_empty() {
        println!("No saved looks yet.");
        println!("\nCreate one with:");
        println!("  zyora generate <subject> <garment>");
        return;
    }

    println!("Saved looks:\n");

    for look in looks {
        println!("  {}  {}", look.id, look.relative_time());
        if let Some(fit) = &look.fit_image_uri {
            if !fit.starts_with("data:") {
                println!("    Garment: {}", fit);
            }
        }
    }
}

fn profile_cli(store: &mut AppStore, edit: ProfileEdit) -> Result<()> {
    if edit == ProfileEdit::default() {
        return whoami(store);
    }

    if !store.update_profile(edit) {
        bail!("Not signed in. Run: zyora login --dev");
    }
    println!("✓ Profile updated");
    whoami(store)
}
