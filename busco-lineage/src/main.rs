use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use entrez::EntrezClient;

use crate::lineage_list::LineageList;

mod lineage_list;

fn main() -> Result<()> {
    let args = Cli::parse();

    let lineages = LineageList::from_json(&args.busco_lineage_database, &args.suffix)
        .context("Failed to load the BUSCO lineage database list")?;

    let client = EntrezClient::new(&args.email).context("Failed to create Entrez client")?;
    let lineage = client
        .fetch_lineage(args.taxon_id)
        .with_context(|| format!("Failed to fetch the lineage of taxon {}", args.taxon_id))?;
    eprintln!("Done fetching lineage");

    match lineages.select_database(&lineage) {
        Some(database) => println!("{database}"),
        None => println!("None"),
    }

    Ok(())
}

#[derive(Parser, Debug)]
struct Cli {
    /// Email address to identify the query with NCBI Entrez
    #[clap(short, long)]
    email: String,

    /// The taxon id to find a lineage database for
    #[clap(short, long)]
    taxon_id: u64,

    /// Path to the JSON file listing the current BUSCO lineage databases
    #[clap(short, long)]
    busco_lineage_database: PathBuf,

    /// Suffix appended to a lowercased rank name to form a database name
    #[clap(long, default_value = "_odb10")]
    suffix: String,
}
