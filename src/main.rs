use std::error::Error;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

use video_blob_kit::config::Config;
use video_blob_kit::media::tools::{FfmpegRemuxer, FfprobeProber};
use video_blob_kit::routes::create_routes;
use video_blob_kit::services::ingest::{IngestPipeline, IngestSettings};
use video_blob_kit::services::password::hash_password;
use video_blob_kit::services::s3::S3Service;
use video_blob_kit::services::signer::UrlSigner;
use video_blob_kit::state::AppState;
use video_blob_kit::store::{SeaOrmStore, UserStore};
use video_blob_kit::telemetry::init_tracing;

type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Parser)]
#[command(name = "video-blob-kit", about = "Video ingestion service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply migrations, then serve the HTTP API (default)
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Register an account; the password is read from the terminal
    CreateUser {
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let db = connect(&config).await?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            Migrator::up(&db, None).await?;
            serve(config, db).await
        }
        Commands::Migrate => {
            Migrator::up(&db, None).await?;
            tracing::info!("migrations applied");
            Ok(())
        }
        Commands::CreateUser { email } => create_user(db, &email).await,
    }
}

async fn connect(config: &Config) -> Result<DatabaseConnection, BoxError> {
    let db = Database::connect(&config.database_url).await?;
    tracing::info!("connected to database");
    Ok(db)
}

async fn serve(config: Config, db: DatabaseConnection) -> Result<(), BoxError> {
    let store = Arc::new(SeaOrmStore::new(db));

    let s3 = S3Service::new(&config).await;
    if let Err(e) = s3.ensure_bucket_exists(&config.s3_bucket).await {
        tracing::warn!(bucket = %config.s3_bucket, error = %e, "could not verify bucket");
    }
    let objects = Arc::new(s3);

    let pipeline = IngestPipeline::new(
        store.clone(),
        objects.clone(),
        Arc::new(FfmpegRemuxer::new(&config.ffmpeg_path)),
        Arc::new(FfprobeProber::new(&config.ffprobe_path)),
        IngestSettings {
            bucket: config.s3_bucket.clone(),
            staging_dir: config.staging_dir.clone(),
            max_upload_bytes: config.max_upload_bytes,
        },
    );
    let signer = UrlSigner::new(objects.clone(), config.presign_ttl);

    let state = AppState::new(
        store.clone(),
        store,
        objects,
        pipeline,
        signer,
        &config.jwt_secret,
    );
    let app = create_routes(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn create_user(db: DatabaseConnection, email: &str) -> Result<(), BoxError> {
    Migrator::up(&db, None).await?;

    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        return Err("password must not be empty".into());
    }
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    if password != confirm {
        return Err("passwords do not match".into());
    }

    let password_hash = hash_password(&password).map_err(|e| e.to_string())?;
    let user = SeaOrmStore::new(db)
        .create_user(email, &password_hash)
        .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "user created");
    Ok(())
}
