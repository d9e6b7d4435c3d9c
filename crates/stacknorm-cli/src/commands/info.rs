use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use stacknorm_core::io::tiff_io::{read_stack, StackInfo};
use stacknorm_core::naming::parse_channel_file;
use stacknorm_core::stack::{RawStack, SampleFormat};

#[derive(Args)]
pub struct InfoArgs {
    /// Input TIFF file
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let stack = read_stack(&args.file)?;
    let info = StackInfo::of(&stack);

    println!("File:        {}", args.file.display());
    if let Some(name) = args.file.file_name().and_then(|n| n.to_str()) {
        let parsed = parse_channel_file(name);
        println!("Group:       {}", parsed.base_name);
        println!("Channel:     {}", parsed.channel_id);
    }
    println!("Pages:       {}", info.pages);
    println!("Dimensions:  {}x{}", info.width, info.height);
    println!("Samples:     {}", info.sample_format);

    let bytes = stack.len() * bytes_per_sample(&stack);
    println!("Data size:   {:.1} MB", bytes as f64 / (1024.0 * 1024.0));

    Ok(())
}

fn bytes_per_sample(stack: &RawStack) -> usize {
    match stack.sample_format() {
        SampleFormat::U8 | SampleFormat::I8 => 1,
        SampleFormat::U16 | SampleFormat::I16 => 2,
        SampleFormat::U32 | SampleFormat::I32 | SampleFormat::F32 => 4,
        SampleFormat::F64 => 8,
    }
}
