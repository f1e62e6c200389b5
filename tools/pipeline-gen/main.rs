use clap::Parser;
use drydock::serializer::{
    CableDocument, InputDocument, OutputDocument, PipelineDocument, PortDocument, StepDocument,
};
use rand::Rng;
use rand::rngs::ThreadRng;
use std::fs;

/// A CLI tool to generate random layered pipeline documents for the drydock loader
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_pipeline.json")]
    output: String,

    /// Number of pipeline inputs
    #[arg(long, default_value_t = 3)]
    inputs: usize,

    /// Number of steps
    #[arg(long, default_value_t = 10)]
    steps: usize,

    /// Maximum number of inputs per step
    #[arg(long, default_value_t = 3)]
    max_ports: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut rng = rand::rng();

    if cli.inputs == 0 || cli.max_ports == 0 {
        eprintln!("Error: --inputs and --max-ports must be at least 1");
        std::process::exit(1);
    }

    println!(
        "Generating pipeline ({} inputs, {} steps, up to {} ports per step)...",
        cli.inputs, cli.steps, cli.max_ports
    );

    let document = generate_pipeline(&mut rng, cli.inputs, cli.steps, cli.max_ports);
    let json_output = document.to_json_pretty()?;
    fs::write(&cli.output, json_output)?;

    println!(
        "Successfully generated and saved pipeline to '{}'",
        cli.output
    );

    Ok(())
}

/// Inputs go in the left column and steps in columns to the right. Every step
/// input is fed by a pipeline input or an earlier step, so the result is acyclic.
fn generate_pipeline(
    rng: &mut ThreadRng,
    input_count: usize,
    step_count: usize,
    max_ports: usize,
) -> PipelineDocument {
    let columns = (step_count as f64).sqrt().ceil().max(1.0) as usize;
    let rows = step_count.div_ceil(columns).max(1);

    let pipeline_inputs: Vec<InputDocument> = (0..input_count)
        .map(|i| InputDocument {
            dataset_name: format!("input_{}", i + 1),
            cdt_pk: None,
            x: 0.05,
            y: (i as f64 + 0.5) / input_count as f64,
        })
        .collect();

    let mut pipeline_steps: Vec<StepDocument> = Vec::with_capacity(step_count);
    for s in 0..step_count {
        let port_count = rng.random_range(1..=max_ports);
        let inputs: Vec<PortDocument> = (0..port_count)
            .map(|p| PortDocument {
                dataset_name: format!("in_{}", p + 1),
                cdt_pk: None,
            })
            .collect();

        let cables_in = inputs
            .iter()
            .map(|port| {
                // Step numbers on the wire are 1-based; 0 is a pipeline input.
                let source_step = rng.random_range(0..=s);
                let source_dataset_name = if source_step == 0 {
                    format!("input_{}", rng.random_range(1..=input_count))
                } else {
                    "out".to_string()
                };
                CableDocument {
                    source_step,
                    source_dataset_name,
                    dest_dataset_name: Some(port.dataset_name.clone()),
                }
            })
            .collect();

        let (col, row) = (s / rows, s % rows);
        pipeline_steps.push(StepDocument {
            transf_pk: rng.random_range(1..1000),
            family_pk: rng.random_range(1..100),
            name: format!("step_{}", s + 1),
            step_num: s + 1,
            x: 0.2 + 0.7 * (col as f64 + 0.5) / columns as f64,
            y: (row as f64 + 0.5) / rows as f64,
            inputs,
            outputs: vec![PortDocument {
                dataset_name: "out".to_string(),
                cdt_pk: None,
            }],
            cables_in,
        });
    }

    let pipeline_outputs = if step_count > 0 {
        vec![OutputDocument {
            output_name: "result".to_string(),
            source_step: step_count,
            source_dataset_name: "out".to_string(),
            x: 0.95,
            y: 0.5,
            id: None,
        }]
    } else {
        Vec::new()
    };

    println!("-> Generated {} steps.", pipeline_steps.len());
    PipelineDocument {
        pipeline_inputs,
        pipeline_steps,
        pipeline_outputs,
    }
}
