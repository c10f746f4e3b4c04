//! SafariBlocker CLI
//!
//! CLI tool for converting filter lists into Safari content blocker
//! JSON.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use clap::{Parser, Subcommand};

use sb_compiler::{convert_array, create_rule, ConvertInput};

#[derive(Parser)]
#[command(name = "sb-cli")]
#[command(about = "SafariBlocker filter list converter and tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert filter lists into content blocker JSON
    Convert {
        /// Input filter list files
        #[arg(short, long, required = true)]
        input: Vec<String>,

        /// Output JSON file
        #[arg(short, long, default_value = "blockerList.json")]
        output: String,

        /// Maximum number of emitted entries (0 disables the cap)
        #[arg(short, long, default_value = "0")]
        limit: usize,

        /// Discard wide generic CSS rules
        #[arg(long)]
        optimize: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Check filter lists convert cleanly (CI gate)
    Check {
        /// Input filter list files
        #[arg(short, long, required = true)]
        input: Vec<String>,

        /// Fail if parse ratio drops below threshold (0.0-1.0)
        #[arg(long, default_value = "0.95")]
        min_parse_ratio: f64,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            limit,
            optimize,
            verbose,
        } => cmd_convert(&input, &output, limit, optimize, verbose),
        Commands::Check {
            input,
            min_parse_ratio,
        } => cmd_check(&input, min_parse_ratio),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn read_inputs(inputs: &[String], verbose: bool) -> Result<Vec<ConvertInput>, String> {
    let mut lines = Vec::new();

    for (index, path) in inputs.iter().enumerate() {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read '{}': {}", path, e))?;

        let line_count = content.lines().count();
        if verbose {
            println!(
                "  [{}] {} - {} lines",
                index,
                Path::new(path).file_name().unwrap_or_default().to_string_lossy(),
                line_count
            );
        }

        lines.extend(content.lines().map(ConvertInput::from));
    }

    Ok(lines)
}

fn cmd_convert(
    inputs: &[String],
    output: &str,
    limit: usize,
    optimize: bool,
    verbose: bool,
) -> Result<(), String> {
    if inputs.is_empty() {
        return Err("No input files specified".to_string());
    }

    let start = Instant::now();
    let lines = read_inputs(inputs, verbose)?;
    let line_count = lines.len();

    let result = convert_array(lines, limit, optimize);
    let elapsed = start.elapsed();

    if verbose {
        for error in &result.errors {
            println!("  {error}");
        }
    }

    let mut file = fs::File::create(output)
        .map_err(|e| format!("Failed to create '{}': {}", output, e))?;
    file.write_all(result.converted.as_bytes())
        .map_err(|e| format!("Failed to write '{}': {}", output, e))?;

    println!("Converted {} filter lists to '{}'", inputs.len(), output);
    println!("  Lines:    {}", line_count);
    if result.over_limit {
        println!(
            "  Entries:  {} -> {} (over the {} entry limit)",
            result.total_converted_count, result.converted_count, limit
        );
    } else {
        println!("  Entries:  {}", result.converted_count);
    }
    println!("  Errors:   {}", result.errors_count);
    println!("  Time:     {:.1}ms", elapsed.as_secs_f64() * 1000.0);

    Ok(())
}

fn cmd_check(inputs: &[String], min_parse_ratio: f64) -> Result<(), String> {
    if inputs.is_empty() {
        return Err("No input files specified".to_string());
    }

    let start = Instant::now();
    let mut total_content_lines = 0usize;
    let mut total_rules = 0usize;
    let mut total_parse_errors = 0usize;

    println!("Checking {} filter list(s)...\n", inputs.len());

    for path in inputs {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read '{}': {}", path, e))?;

        let mut content_lines = 0usize;
        let mut rules = 0usize;
        let mut parse_errors = 0usize;

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('!') || trimmed.starts_with('[') {
                continue;
            }
            content_lines += 1;
            match create_rule(line) {
                Ok(Some(_)) => rules += 1,
                Ok(None) => {}
                Err(_) => parse_errors += 1,
            }
        }

        total_content_lines += content_lines;
        total_rules += rules;
        total_parse_errors += parse_errors;

        let parse_ratio = if content_lines > 0 {
            rules as f64 / content_lines as f64
        } else {
            1.0
        };
        let status = if parse_ratio >= min_parse_ratio { "OK" } else { "WARN" };

        println!(
            "[{}] {} - {} content lines -> {} rules ({:.1}%, {} parse errors)",
            status,
            Path::new(path).file_name().unwrap_or_default().to_string_lossy(),
            content_lines,
            rules,
            parse_ratio * 100.0,
            parse_errors
        );
    }

    let elapsed = start.elapsed();
    let overall_ratio = if total_content_lines > 0 {
        total_rules as f64 / total_content_lines as f64
    } else {
        1.0
    };

    println!("\n--- Summary ---");
    println!("Content lines:   {}", total_content_lines);
    println!("Rules parsed:    {}", total_rules);
    println!("Parse errors:    {}", total_parse_errors);
    println!("Parse ratio:     {:.2}%", overall_ratio * 100.0);
    println!("Time:            {:.1}ms", elapsed.as_secs_f64() * 1000.0);

    if overall_ratio < min_parse_ratio {
        return Err(format!(
            "Parse ratio {:.2}% is below threshold {:.2}%",
            overall_ratio * 100.0,
            min_parse_ratio * 100.0
        ));
    }

    println!("\n✓ All checks passed");
    Ok(())
}
