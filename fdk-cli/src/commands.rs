// SPDX-License-Identifier: AGPL-3.0-or-later
//! CLI command implementations

use bytes::Bytes;
use console::style;
use fdk_core::{Driver, DriverRegistry, File};
use futures::StreamExt;
use std::path::Path;
use tabled::{Table, Tabled};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::CliResult;

/// Format entry kind
fn format_kind(file: &File) -> String {
    if file.is_dir {
        style("d").cyan().to_string()
    } else {
        "-".to_string()
    }
}

#[derive(Tabled)]
struct LsEntry {
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Path")]
    path: String,
}

/// Load command input from a file, or stdin when none is given
async fn load_input(file: Option<&Path>) -> CliResult<Bytes> {
    let data = match file {
        Some(path) => tokio::fs::read(path).await?,
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin().read_to_end(&mut buf).await?;
            buf
        }
    };
    Ok(Bytes::from(data))
}

/// List registered drivers
pub fn drivers(registry: &DriverRegistry) -> CliResult<()> {
    println!("Registered drivers:");
    for name in registry.names() {
        println!("  {}", style(name).green());
    }
    Ok(())
}

/// Report whether a path exists
pub async fn exists(driver: &dyn Driver, path: &str) -> CliResult<()> {
    println!("{}", driver.exists(path).await);
    Ok(())
}

/// Display file contents
pub async fn cat(driver: &dyn Driver, path: &str) -> CliResult<()> {
    let mut stream = driver.read(path).await?;
    let mut stdout = tokio::io::stdout();
    while let Some(chunk) = stream.next().await {
        stdout.write_all(&chunk?).await?;
    }
    stdout.flush().await?;
    Ok(())
}

/// List directory contents
pub async fn ls(driver: &dyn Driver, path: &str, json: bool) -> CliResult<()> {
    let files = driver.list(path).await?;

    if json {
        let out = serde_json::to_string_pretty(&files)
            .map_err(|e| fdk_core::FdkError::Serialization(e.to_string()))?;
        println!("{out}");
        return Ok(());
    }

    if files.is_empty() {
        println!("(empty directory)");
        return Ok(());
    }

    let entries: Vec<LsEntry> = files
        .iter()
        .map(|f| LsEntry {
            kind: format_kind(f),
            path: f.path.clone(),
        })
        .collect();
    println!("{}", Table::new(entries));
    Ok(())
}

/// Create a new file; refuses to overwrite
pub async fn put(driver: &dyn Driver, path: &str, file: Option<&Path>) -> CliResult<()> {
    let data = load_input(file).await?;
    let len = data.len();
    driver.write(path, data).await?;
    println!("Wrote {path} ({len} bytes)");
    Ok(())
}

/// Create or overwrite a file
pub async fn update(driver: &dyn Driver, path: &str, file: Option<&Path>) -> CliResult<()> {
    let data = load_input(file).await?;
    let len = data.len();
    driver.update(path, data).await?;
    println!("Updated {path} ({len} bytes)");
    Ok(())
}

/// Create directories
pub async fn mkdir(driver: &dyn Driver, paths: &[String]) -> CliResult<()> {
    for path in paths {
        driver.create_dir(path).await?;
        println!("Created {path}");
    }
    Ok(())
}

/// Remove directories and their contents
pub async fn rmdir(driver: &dyn Driver, paths: &[String]) -> CliResult<()> {
    for path in paths {
        driver.delete_dir(path).await?;
        println!("Removed {path}");
    }
    Ok(())
}

/// Remove files
pub async fn rm(driver: &dyn Driver, paths: &[String]) -> CliResult<()> {
    for path in paths {
        driver.delete(path).await?;
        println!("Removed {path}");
    }
    Ok(())
}

/// Move/rename files
pub async fn mv(driver: &dyn Driver, source: &str, dest: &str) -> CliResult<()> {
    driver.rename(source, dest).await?;
    println!("Moved {source} -> {dest}");
    Ok(())
}

/// Copy files
pub async fn cp(driver: &dyn Driver, source: &str, dest: &str) -> CliResult<()> {
    driver.copy(source, dest).await?;
    println!("Copied {source} -> {dest}");
    Ok(())
}
