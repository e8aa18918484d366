//! Dump the directory of a compound file.
//!
//! Prints every directory entry with its type, size, timestamps and the
//! first bytes of its content, then optionally the root's child list.
//!
//! ```bash
//! RUST_LOG=ole2_reader=debug cargo run --example dump_entries -- test.doc --children
//! ```

use clap::Parser;
use ole2_reader::ole::{MiniStreamAddressing, OleFile, OleOptions, is_ole_file};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "List the storages and streams inside an OLE2 compound file")]
struct Args {
    /// Compound file to read (.doc, .xls, .ppt, .msi, ...)
    path: PathBuf,

    /// Number of content bytes to preview per entry
    #[arg(long, default_value_t = 100)]
    preview: usize,

    /// Also list the children of the root storage
    #[arg(long)]
    children: bool,

    /// Read storages and unknown entries as if they were streams
    #[arg(long)]
    force: bool,

    /// Follow the mini-stream allocation table instead of linear addressing
    #[arg(long)]
    mini_fat: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    let data = std::fs::read(&args.path)?;
    println!("{}", args.path.display());

    if !is_ole_file(&data) {
        println!("not a compound file");
        return Ok(());
    }

    let mut options = OleOptions::new();
    if args.mini_fat {
        options = options.with_mini_stream_addressing(MiniStreamAddressing::MiniFat);
    }
    let ole = OleFile::open_with_options(&data, options)?;

    let header = ole.header();
    println!(
        "version {}.{}, {}-byte blocks, {}-byte small blocks, threshold {}",
        header.major_version,
        header.minor_version,
        header.big_block_size(),
        header.small_block_size(),
        header.threshold
    );

    for entry in ole.entries() {
        println!("Property {}", entry.index);
        println!("  name:     {:?}", entry.name);
        println!("  type:     {}", entry.entry_type.as_str());
        println!("  links:    prev {} next {} dir {}", entry.prev, entry.next, entry.dir);
        println!("  start:    {}  size: {}", entry.start, entry.size);
        if !entry.clsid_string().is_empty() {
            println!("  clsid:    {}", entry.clsid_string());
        }
        if let Some(created) = entry.created() {
            println!("  created:  {}", created);
        }
        if let Some(modified) = entry.modified() {
            println!("  modified: {}", modified);
        }

        match ole.content(entry, args.force) {
            Ok(content) => {
                let preview = &content[..content.len().min(args.preview)];
                println!("  data:     {:02X?} length {}", preview, content.len());
            },
            Err(e) => println!("  data:     unreadable ({})", e),
        }
    }

    if args.children {
        println!();
        println!("Children of root:");
        for child in ole.children(ole.root()) {
            println!("  [{}] {} ({})", child.index, child.name, child.entry_type.as_str());
        }
    }

    Ok(())
}
