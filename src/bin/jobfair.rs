use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use bytes::Bytes;
use clap::{Args, Parser, Subcommand};
use jobfair_backend::config::Config;
use jobfair_backend::models::upload::CvFile;
use jobfair_backend::services::catalog_service::{self, ImportFormat};
use jobfair_backend::services::catalog_store::{AdminSession, Catalog, FileCatalogStore};
use jobfair_backend::services::submission_service::{
    ApplicationForm, HttpSubmissionTransport, LinkOpener, SubmissionService, SubmitOutcome,
};
use jobfair_backend::utils::{time, validation};
use serde_json::{json, Map, Value as JsonValue};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "jobfair",
    about = "Manage the job fair vacancy catalog and apply to vacancies",
    version
)]
struct Cli {
    /// Directory holding the catalog and the organizer session flag
    #[arg(long, global = true, env = "JOBFAIR_DATA_DIR", default_value = ".jobfair")]
    data_dir: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace the catalog with a JSON or CSV file
    Import {
        file: PathBuf,
    },
    /// Replace the catalog with a published CSV sheet
    LoadSheet {
        url: String,
    },
    /// Write the catalog as pretty JSON
    ExportJson {
        /// Output path (defaults to a dated file name in the current directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show vacancies, optionally filtered
    List {
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long = "type", default_value = "All")]
        job_type: String,
    },
    /// Add a vacancy at the top of the catalog
    Add(AddArgs),
    /// Remove a vacancy by id
    Delete {
        id: String,
    },
    /// Start an organizer session
    Login {
        passcode: String,
    },
    /// End the organizer session
    Logout,
    /// Apply to a vacancy through a running server
    Apply(ApplyArgs),
}

#[derive(Args, Debug)]
struct AddArgs {
    #[arg(long)]
    title: String,
    #[arg(long, default_value = "")]
    company: String,
    #[arg(long, default_value = "")]
    location: String,
    #[arg(long = "type", default_value = "")]
    job_type: String,
    /// Comma separated
    #[arg(long, default_value = "")]
    tags: String,
    #[arg(long, default_value = "")]
    description: String,
    /// Separated by `;` or new lines
    #[arg(long, default_value = "")]
    responsibilities: String,
    /// Separated by `;` or new lines
    #[arg(long, default_value = "")]
    requirements: String,
    #[arg(long)]
    apply_link: Option<String>,
}

#[derive(Args, Debug)]
struct ApplyArgs {
    job_id: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    cv: Option<PathBuf>,
    #[arg(long, env = "JOBFAIR_SERVER", default_value = "http://localhost:3000")]
    server: String,
}

/// Prints external apply links instead of opening a browser.
struct PrintOpener;

impl LinkOpener for PrintOpener {
    fn open(&self, url: &str) {
        println!("Continue your application at: {}", url);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let catalog = Catalog::new(
        FileCatalogStore::new(cli.data_dir.join("vacancies.json")),
        AdminSession::new(cli.data_dir.join("admin.flag"), &config.admin_passcode),
    );

    match cli.command {
        Command::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let format = ImportFormat::detect(&file.to_string_lossy(), None);
            let vacancies = catalog_service::import_vacancies(&text, format)?;
            catalog.replace(&vacancies)?;
            println!("Imported {} vacancies", vacancies.len());
        }
        Command::LoadSheet { url } => {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()?;
            let vacancies = catalog_service::load_from_sheet(&client, &url).await?;
            catalog.replace(&vacancies)?;
            println!("Loaded {} vacancies", vacancies.len());
        }
        Command::ExportJson { out } => {
            let (filename, body) = catalog_service::export_json(&catalog.vacancies()?, time::now())?;
            let path = out.unwrap_or_else(|| PathBuf::from(filename));
            std::fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        Command::List { query, job_type } => {
            let vacancies = catalog.vacancies()?;
            let hits = catalog_service::search(&vacancies, &query, &job_type);
            if hits.is_empty() {
                println!("No vacancies match.");
            }
            for v in hits {
                println!("{}\t{}\t{}\t{}\t{}", v.id, v.title, v.company, v.location, v.job_type);
            }
        }
        Command::Add(args) => {
            let vacancy = catalog.add(&add_payload(args))?;
            println!("Added {} ({})", vacancy.title, vacancy.id);
        }
        Command::Delete { id } => {
            if catalog.delete(&id)? {
                println!("Deleted {}", id);
            } else {
                println!("No vacancy with id {}", id);
            }
        }
        Command::Login { passcode } => {
            if !catalog.session().activate(&passcode)? {
                bail!("Incorrect passcode");
            }
            println!("Organizer session started");
        }
        Command::Logout => {
            catalog.session().deactivate()?;
            println!("Organizer session ended");
        }
        Command::Apply(args) => apply(&catalog, args).await?,
    }

    Ok(())
}

fn add_payload(args: AddArgs) -> JsonValue {
    let mut raw = Map::new();
    raw.insert("title".into(), json!(args.title));
    raw.insert("company".into(), json!(args.company));
    raw.insert("location".into(), json!(args.location));
    raw.insert("type".into(), json!(args.job_type));
    raw.insert("tags".into(), json!(args.tags));
    raw.insert("description".into(), json!(args.description));
    raw.insert("responsibilities".into(), json!(args.responsibilities));
    raw.insert("requirements".into(), json!(args.requirements));
    if let Some(link) = args.apply_link {
        raw.insert("applyLink".into(), json!(link));
    }
    JsonValue::Object(raw)
}

async fn apply(catalog: &Catalog<FileCatalogStore>, args: ApplyArgs) -> anyhow::Result<()> {
    let Some(vacancy) = catalog.find(&args.job_id)? else {
        bail!("No vacancy with id {}", args.job_id);
    };

    let cv = match &args.cv {
        Some(path) => Some(read_cv(path)?),
        None => None,
    };
    let mut form = ApplicationForm {
        name: args.name,
        email: args.email,
        phone: args.phone,
        cv,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()?;
    let transport = HttpSubmissionTransport::new(client, &args.server);
    let mut service = SubmissionService::new(transport, PrintOpener);

    match service.submit(&vacancy, &mut form).await? {
        SubmitOutcome::Recorded => println!("Application sent for {}", vacancy.title),
        SubmitOutcome::Redirected(_) => {}
    }
    Ok(())
}

fn read_cv(path: &Path) -> anyhow::Result<CvFile> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cv".to_string());
    Ok(CvFile {
        bytes: Bytes::from(bytes),
        content_type: validation::cv_type_for_filename(&filename).to_string(),
        filename,
    })
}
