use clap::{Parser, Subcommand};
use item_names_dataset::dataset::{self, DatasetArgsBuilder};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(about = "Load item-name snapshots into a SQLite store and read them back")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build (or rebuild) the store from a directory of Parquet snapshots
    Build {
        /// Path of the SQLite store file
        #[arg(short, long)]
        db: PathBuf,

        /// Directory containing .parquet snapshot files
        #[arg(short, long)]
        snapshots: PathBuf,

        /// Data table name
        #[arg(short, long, default_value = "items")]
        table: String,

        /// Snapshot column to load
        #[arg(short, long, default_value = "name")]
        column: String,

        /// Load at most this many snapshot files
        #[arg(long)]
        cap: Option<usize>,

        /// Show a progress bar and per-file logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the row count of an existing store
    Len {
        /// Path of the SQLite store file
        #[arg(short, long)]
        db: PathBuf,

        /// Data table name
        #[arg(short, long, default_value = "items")]
        table: String,

        /// Text column of the data table
        #[arg(short, long, default_value = "name")]
        column: String,
    },

    /// Print the item name at a zero-based index
    Get {
        /// Path of the SQLite store file
        #[arg(short, long)]
        db: PathBuf,

        /// Zero-based row index
        #[arg(short, long)]
        index: usize,

        /// Data table name
        #[arg(short, long, default_value = "items")]
        table: String,

        /// Text column of the data table
        #[arg(short, long, default_value = "name")]
        column: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Build {
            db,
            snapshots,
            table,
            column,
            cap,
            verbose,
        } => {
            init_tracing(verbose);

            let mut builder = DatasetArgsBuilder::default();
            builder
                .db_path(db)
                .table_name(table)
                .column_name(column)
                .rebuild(true)
                .snapshot_dir(snapshots)
                .verbose(verbose);
            if let Some(cap) = cap {
                builder.file_cap(cap);
            }

            let start = Instant::now();
            let dataset = dataset::open_or_create(builder.build()?).await?;

            println!();
            println!("Build Summary");
            println!("=============");
            println!("Rows: {}", dataset.len());
            println!("Duration: {:.2}s", start.elapsed().as_secs_f64());
        }

        Command::Len { db, table, column } => {
            init_tracing(false);

            let args = DatasetArgsBuilder::default()
                .db_path(db)
                .table_name(table)
                .column_name(column)
                .build()?;
            let dataset = dataset::open_or_create(args).await?;
            println!("{}", dataset.len());
        }

        Command::Get {
            db,
            index,
            table,
            column,
        } => {
            init_tracing(false);

            let args = DatasetArgsBuilder::default()
                .db_path(db)
                .table_name(table)
                .column_name(column)
                .build()?;
            let dataset = dataset::open_or_create(args).await?;
            println!("{}", dataset.get(index).await?);
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let filter = if verbose {
        EnvFilter::new("item_names_dataset=debug")
    } else {
        EnvFilter::new("item_names_dataset=info")
    };
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
