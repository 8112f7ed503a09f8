use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use delaymap_core::io::{discover_inputs, open_source, InputFormat};

#[derive(Args)]
pub struct InfoArgs {
    /// Recordings (TIFF stacks, SER files) or directories containing them
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let inputs = discover_inputs(&args.files)?;

    for (index, path) in inputs.iter().enumerate() {
        let source = open_source(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let (height, width) = source.frame_shape();
        let format = InputFormat::from_path(path)
            .map(|f| f.to_string())
            .unwrap_or_default();

        if index > 0 {
            println!();
        }
        println!("File:        {}", path.display());
        println!("Format:      {}", format);
        println!("Frames:      {}", source.frame_count());
        println!("Dimensions:  {}x{}", width, height);

        let total_mb =
            (source.frame_count() * width * height * std::mem::size_of::<f64>()) as f64
                / (1024.0 * 1024.0);
        println!("In memory:   {:.1} MB", total_mb);
    }

    Ok(())
}
