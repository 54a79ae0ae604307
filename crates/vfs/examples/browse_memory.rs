//! Example: Browse a small in-memory archive through the bag provider.
//!
//! Usage:
//!   cargo run -p rusty-bags-vfs --example browse_memory -- [path] [options]
//!
//! Options:
//!   --json         Print the display info of each node as JSON
//!   --cat <path>   Print the content of one file instead of walking
//!
//! Example:
//!   RUST_LOG=rusty_bags_vfs=debug cargo run -p rusty-bags-vfs --example browse_memory -- /digitised
//!   cargo run -p rusty-bags-vfs --example browse_memory -- --cat /digitised/b1234/v2/data/b1234.xml

use std::sync::Arc;

use rusty_bags_model::{Bag, BagFile, BagLocation, BagManifest, BagVersion};
use rusty_bags_storage::{BagCache, MemoryBagSource, MemoryMetadataIndex, MemoryObjectStore};
use rusty_bags_vfs::{Backends, BagProvider, ResourceNode, VfsError, VfsOptions};
use tracing_subscriber::EnvFilter;

const BUCKET: &str = "wellcomecollection-storage";

/// CLI arguments for the browse_memory example.
struct CliArgs {
    path: String,
    json: bool,
    cat: Option<String>,
}

impl CliArgs {
    /// Parse CLI arguments.
    fn parse() -> Result<Self, String> {
        let mut args = std::env::args().skip(1);
        let mut parsed: CliArgs = CliArgs {
            path: "/".to_string(),
            json: false,
            cat: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--json" => parsed.json = true,
                "--cat" => {
                    parsed.cat = Some(args.next().ok_or("--cat requires a path")?);
                }
                other if other.starts_with("--") => {
                    return Err(format!("Unknown option: {}", other));
                }
                other => parsed.path = other.to_string(),
            }
        }
        Ok(parsed)
    }
}

/// Build a bag whose payload lives under `v1` and tag files under `version`.
fn bag(space: &str, id: &str, version: &str, payload: &[&str]) -> Bag {
    let files: Vec<BagFile> = payload
        .iter()
        .map(|name| BagFile::new(*name, format!("v1/{}", name)))
        .collect();
    let tags: Vec<BagFile> = ["bag-info.txt", "bagit.txt", "manifest-sha256.txt"]
        .iter()
        .map(|name| BagFile::new(*name, format!("{}/{}", version, name)))
        .collect();
    Bag::new(
        BagManifest::new(files),
        BagManifest::new(tags),
        BagLocation::new(BUCKET, format!("{}/{}", space, id)),
    )
}

/// Populate in-memory backends with a couple of spaces.
fn sample_backends() -> Result<Backends, VfsError> {
    let v1: BagVersion = BagVersion::FIRST;
    let v2: BagVersion = BagVersion::new(2).ok_or_else(|| VfsError::not_found("v2"))?;

    let index: MemoryMetadataIndex = MemoryMetadataIndex::new();
    index.insert("digitised", "b1234", v2);
    index.insert("born-digital", "PP/CRI/J/2/3", v1);

    let bags: MemoryBagSource = MemoryBagSource::new();
    let objects: MemoryObjectStore = MemoryObjectStore::new();

    let b1234: [&str; 3] = [
        "data/b1234.xml",
        "data/objects/b1234_0001.jp2",
        "data/objects/b1234_0002.jp2",
    ];
    bags.insert("digitised", "b1234", v1, bag("digitised", "b1234", "v1", &b1234));
    bags.insert("digitised", "b1234", v2, bag("digitised", "b1234", "v2", &b1234));
    objects.insert(
        BUCKET,
        "digitised/b1234/v1/data/b1234.xml",
        "<mets:mets>b1234</mets:mets>\n",
    );

    let cri: [&str; 2] = ["data/letter.pdf", "data/photos/beach.jpg"];
    bags.insert(
        "born-digital",
        "PP/CRI/J/2/3",
        v1,
        bag("born-digital", "PP/CRI/J/2/3", "v1", &cri),
    );

    Ok(Backends::new(Arc::new(index), Arc::new(bags), Arc::new(objects))
        .with_bag_cache(Arc::new(BagCache::default())))
}

/// Print a node and everything below it.
fn walk(node: &ResourceNode, depth: usize, json: bool) -> Result<(), VfsError> {
    let indent: String = "  ".repeat(depth);
    let label: &str = if node.name().is_empty() { "/" } else { node.name() };

    if json {
        let info: String = serde_json::to_string(&node.display_info())
            .map_err(|e| VfsError::Io(std::io::Error::other(e)))?;
        println!("{}{} {}", indent, label, info);
    } else if node.is_collection() {
        println!("{}{}/", indent, label);
    } else {
        println!("{}{} ({})", indent, label, node.content_type()?);
    }

    if !node.is_collection() {
        return Ok(());
    }
    for name in node.list_child_names()? {
        if let Some(child) = node.get_child(&name)? {
            walk(&child, depth + 1, json)?;
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: CliArgs = match CliArgs::parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &CliArgs) -> Result<(), VfsError> {
    let provider: BagProvider = BagProvider::new(sample_backends()?, VfsOptions::default())?;

    if let Some(path) = &args.cat {
        let node: ResourceNode = provider
            .get_resource_node(path)?
            .ok_or_else(|| VfsError::not_found(path.as_str()))?;
        println!("# {} bytes, {}", node.content_length()?, node.content_type()?);
        let body: Vec<u8> = node.open_content()?.read_to_vec()?;
        print!("{}", String::from_utf8_lossy(&body));
        return Ok(());
    }

    match provider.get_resource_node(&args.path)? {
        Some(node) => walk(&node, 0, args.json),
        None => Err(VfsError::not_found(args.path.as_str())),
    }
}
