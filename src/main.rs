use chrono::Local;
use clap::Parser;
use core::time::Duration;
use env_logger::{Builder, Target};
use log::LevelFilter;
use mongodb::options::CreateIndexOptions;
use serde_json::json;
use std::io::Write;

use mongodb_index_copy::{IndexCopy, Namespace, UnknownFieldPolicy, DB};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Default connection uri
    #[arg(short, long, env = "MONGODB_URI")]
    uri: String,

    /// Collection to read indexes from, as <database>.<collection>
    #[arg(short, long, env = "SOURCE_NAMESPACE")]
    source: Namespace,

    /// Collection to create indexes on, as <database>.<collection>
    #[arg(short, long, env = "DESTINATION_NAMESPACE")]
    destination: Namespace,

    /// Index to copy, may be repeated. Copies every index when omitted
    #[arg(short, long = "index")]
    indexes: Vec<String>,

    /// Fail on index fields this tool does not recognize
    #[arg(long, env = "INDEX_COPY_STRICT", default_value = "false")]
    strict: bool,

    /// Server-side time limit for the createIndexes command
    #[arg(long)]
    max_time_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    // Initialize log Builder
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{{\"date\": \"{}\", \"level\": \"{}\", \"log\": {}}}",
                Local::now().format("%Y-%m-%dT%H:%M:%S:%f"),
                record.level(),
                json!(record.args().to_string())
            )
        })
        .target(Target::Stdout)
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let db = DB::init(&args.uri).await?;
    let source = db.collection(&args.source);
    let destination = db.collection(&args.destination);

    let policy = if args.strict {
        UnknownFieldPolicy::Reject
    } else {
        UnknownFieldPolicy::Ignore
    };
    let copier = IndexCopy::new().unknown_fields(policy);

    let create_options = args.max_time_ms.map(|ms| {
        CreateIndexOptions::builder()
            .max_time(Duration::from_millis(ms))
            .build()
    });

    log::info!("Copying indexes from {} to {}", args.source, args.destination);
    let result = if args.indexes.is_empty() {
        copier.copy_all(&source, &destination, create_options).await
    } else {
        copier
            .copy_named(args.indexes.clone(), &source, &destination, create_options)
            .await
    };

    match result {
        Ok(copied) => {
            println!("{}", json!({ "copied": copied }));
            Ok(())
        }
        Err(e) => {
            log::error!("{}: {}", e, e.cause());
            Err(e.into())
        }
    }
}
