//! `cardex` — command-line client for a cardex server.
//!
//! # Usage
//!
//! ```text
//! cardex --url http://localhost:8080 list --sort name
//! cardex --config ~/.config/cardex/config.toml scan card.jpg --save
//! ```

mod client;
mod render;

use std::{
  io::Write as _,
  path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use cardex_core::{
  CardId, NewCard, Tag,
  query::{SortKey, SortOrder},
};
use cardex_export::Format;
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, ListFilter};
use serde::Deserialize;
use strum::IntoEnumIterator as _;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "cardex", about = "Command-line client for the cardex business card store")]
struct Args {
  /// Path to a TOML config file (url).
  #[arg(short, long, value_name = "FILE", global = true)]
  config: Option<PathBuf>,

  /// Base URL of the cardex server (default: http://localhost:8080).
  #[arg(long, env = "CARDEX_URL", global = true)]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List stored cards.
  List {
    /// Sort by name, company or date.
    #[arg(long)]
    sort: Option<SortKey>,
    /// Sort descending.
    #[arg(long)]
    desc: bool,
    /// Only cards carrying this tag (repeatable).
    #[arg(long = "tag")]
    tags: Vec<Tag>,
  },
  /// Free-text search over names, company, title, department, email and
  /// mobile.
  Search { query: String },
  /// Show one card.
  Show { id: String },
  /// Add a card by hand.
  Add(AddArgs),
  /// Delete one card.
  Delete { id: String },
  /// Delete every card.
  Clear {
    /// Confirm the deletion.
    #[arg(long)]
    yes: bool,
  },
  /// Show aggregate statistics.
  Stats,
  /// Export every card to a file.
  Export {
    #[arg(long, default_value = "csv")]
    format: Format,
    /// Output path (default: business-cards.<format>).
    #[arg(long)]
    out: Option<PathBuf>,
  },
  /// Upload a card photograph and extract its fields.
  Scan {
    image: PathBuf,
    /// Store the extracted card.
    #[arg(long)]
    save: bool,
  },
  /// List the available tags.
  Tags,
}

#[derive(clap::Args, Debug)]
struct AddArgs {
  #[arg(long)]
  name:       Option<String>,
  #[arg(long)]
  first_name: Option<String>,
  #[arg(long)]
  last_name:  Option<String>,
  #[arg(long)]
  company:    Option<String>,
  #[arg(long)]
  title:      Option<String>,
  #[arg(long)]
  department: Option<String>,
  #[arg(long)]
  mobile:     Option<String>,
  #[arg(long)]
  phone:      Option<String>,
  #[arg(long)]
  email:      Option<String>,
  #[arg(long)]
  address:    Option<String>,
  #[arg(long)]
  website:    Option<String>,
  #[arg(long)]
  notes:      Option<String>,
  #[arg(long = "tag")]
  tags:       Vec<Tag>,
}

impl AddArgs {
  fn into_new_card(self) -> NewCard {
    NewCard {
      company_name:  self.company.unwrap_or_default(),
      full_name:     self.name.unwrap_or_default(),
      first_name:    self.first_name.unwrap_or_default(),
      last_name:     self.last_name.unwrap_or_default(),
      job_title:     self.title.unwrap_or_default(),
      department:    self.department.unwrap_or_default(),
      mobile_number: self.mobile.unwrap_or_default(),
      phone_number:  self.phone.unwrap_or_default(),
      email:         self.email.unwrap_or_default(),
      address:       self.address.unwrap_or_default(),
      website:       self.website.unwrap_or_default(),
      notes:         self.notes.unwrap_or_default(),
      image_source:  None,
      tags:          self.tags.into_iter().collect(),
    }
  }
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  // Diagnostics go to stderr so command output stays pipeable.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
  };
  tracing::debug!(url = %api_config.base_url, "using server");

  let client = ApiClient::new(api_config)?;
  run(&client, args.command).await
}

fn warn_degraded(degraded: bool) {
  if degraded {
    eprintln!("warning: the server could not read its card store; results are empty");
  }
}

async fn run(client: &ApiClient, command: Command) -> Result<()> {
  match command {
    Command::List { sort, desc, tags } => {
      let filter = ListFilter {
        tags,
        sort: sort.or(desc.then_some(SortKey::Name)),
        order: desc.then_some(SortOrder::Desc),
        ..Default::default()
      };
      let cards = client.list_cards(&filter).await?;
      warn_degraded(cards.degraded);
      print!("{}", render::card_table(&cards.value));
    }

    Command::Search { query } => {
      let filter = ListFilter { text: Some(query), ..Default::default() };
      let cards = client.list_cards(&filter).await?;
      warn_degraded(cards.degraded);
      print!("{}", render::card_table(&cards.value));
    }

    Command::Show { id } => {
      let card = client.get_card(&CardId::from(id)).await?;
      print!("{}", render::card_detail(&card));
    }

    Command::Add(add) => {
      let card = client.create_card(&add.into_new_card()).await?;
      println!("Added {}", card.id);
    }

    Command::Delete { id } => {
      client.delete_card(&CardId::from(id)).await?;
      println!("Deleted.");
    }

    Command::Clear { yes } => {
      if !yes {
        bail!("refusing to delete every card without --yes");
      }
      client.clear_cards().await?;
      println!("All cards deleted.");
    }

    Command::Stats => {
      let stats = client.stats().await?;
      warn_degraded(stats.degraded);
      print!("{}", render::statistics(&stats.value));
    }

    Command::Export { format, out } => {
      let bytes = client.export(format).await?;
      let path = out.unwrap_or_else(|| PathBuf::from(format.file_name()));
      std::fs::write(&path, &bytes)
        .with_context(|| format!("writing {}", path.display()))?;
      println!("Wrote {} bytes to {}", bytes.len(), path.display());
    }

    Command::Scan { image, save } => scan(client, &image, save).await?,

    Command::Tags => {
      let mut stdout = std::io::stdout().lock();
      for tag in Tag::iter() {
        writeln!(stdout, "{tag}")?;
      }
    }
  }
  Ok(())
}

/// Upload `image`, extract its fields and optionally store the result.
async fn scan(client: &ApiClient, image: &Path, save: bool) -> Result<()> {
  let bytes = std::fs::read(image)
    .with_context(|| format!("reading {}", image.display()))?;
  if bytes.is_empty() {
    bail!("{} is empty", image.display());
  }

  let image_url = client.upload_image(&B64.encode(&bytes)).await?;
  tracing::info!(%image_url, "uploaded");

  let extraction = client.extract(&image_url).await?;
  let fields = match (extraction.success, extraction.data) {
    (true, Some(fields)) => fields,
    _ => bail!(
      "could not read the card ({}); add it by hand with `cardex add`",
      extraction.error.as_deref().unwrap_or("no data returned")
    ),
  };
  print!("{}", render::extracted_fields(&fields));

  if save {
    let mut card = NewCard::from_fields(fields);
    card.image_source = Some(image_url);
    let card = client.create_card(&card).await?;
    println!("Added {}", card.id);
  }
  Ok(())
}
