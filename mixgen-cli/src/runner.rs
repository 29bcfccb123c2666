use std::collections::HashMap;
use std::path::PathBuf;

use clap::ArgMatches;
use log::{error, info};
use mixgen_lib::{
    generate_mixtures, plan, Combine, MixgenError, Options, ParameterSet, PlanEntry,
    ReferenceRenderer, Result, Source, SourceLabel, Spatial,
};
use serde::Serialize;

/// Source paths and options gathered from the command line.
struct Inputs {
    targets: Vec<String>,
    interferers: Vec<Vec<String>>,
    options: Options,
}

#[derive(Serialize)]
struct PlanReport {
    combine: Combine,
    iterations: usize,
    mixtures: Vec<PlanEntry>,
}

pub fn run(args: &ArgMatches) -> Result<i32> {
    match args.subcommand() {
        Some(("generate", sub)) => run_generate(sub),
        Some(("plan", sub)) => run_plan(sub),
        Some(("create", sub)) => run_create(sub),
        _ => {
            error!("No command given");
            Ok(-1)
        }
    }
}

fn run_generate(args: &ArgMatches) -> Result<i32> {
    info!("Starting mixture generation");
    let inputs = read_inputs(args)?;

    // Decode each distinct path once; clones share the samples.
    let mut loaded: HashMap<String, Source> = HashMap::new();
    let mut load = |path: &String| -> Result<Source> {
        if let Some(source) = loaded.get(path) {
            return Ok(source.duplicate());
        }
        let source = Source::from_file(path)?;
        loaded.insert(path.clone(), source.duplicate());
        Ok(source)
    };

    let targets = inputs
        .targets
        .iter()
        .map(&mut load)
        .collect::<Result<Vec<_>>>()?;
    let interferers = inputs
        .interferers
        .iter()
        .map(|row| row.iter().map(&mut load).collect::<Result<Vec<_>>>())
        .collect::<Result<Vec<_>>>()?;

    let params = ParameterSet::builder(targets, interferers)
        .options(inputs.options)
        .cache(true)
        .build()?;

    let mut renderer = ReferenceRenderer::new();
    let mixtures = generate_mixtures(&params, &mut renderer)?;

    println!(
        "Wrote {} mixture(s) to {}",
        mixtures.len(),
        params.folder().display()
    );
    Ok(0)
}

fn run_plan(args: &ArgMatches) -> Result<i32> {
    let inputs = read_inputs(args)?;

    let targets: Vec<SourceLabel> = inputs.targets.iter().map(SourceLabel::new).collect();
    let interferers: Vec<Vec<SourceLabel>> = inputs
        .interferers
        .iter()
        .map(|row| row.iter().map(SourceLabel::new).collect())
        .collect();

    let params = ParameterSet::builder(targets, interferers)
        .options(inputs.options)
        .build()?;

    let report = PlanReport {
        combine: params.combination().mode(),
        iterations: params.iteration_count(),
        mixtures: plan(&params),
    };
    info!(
        "Planned {} mixture(s) with {} combination",
        report.iterations, report.combine
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(0)
}

fn run_create(args: &ArgMatches) -> Result<i32> {
    match args.subcommand() {
        Some(("options-json", sub)) => {
            let count = sub
                .get_one::<String>("interferer-count")
                .map(String::as_str)
                .unwrap_or("1");
            let count = count.parse::<usize>().map_err(|_| {
                MixgenError::Configuration(format!("invalid interferer count: {}", count))
            })?;
            println!("{}", serde_json::to_string_pretty(&Options::template(count))?);
            Ok(0)
        }
        _ => {
            error!("Unknown create command");
            Ok(-1)
        }
    }
}

/// Collect sources and options; flags override pairs, which override the options file.
fn read_inputs(args: &ArgMatches) -> Result<Inputs> {
    let targets: Vec<String> = args
        .get_many::<String>("target")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let interferers: Vec<Vec<String>> = args
        .get_many::<String>("interferers")
        .map(|rows| {
            rows.map(|row| {
                row.split(',')
                    .map(str::trim)
                    .filter(|path| !path.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .collect()
        })
        .unwrap_or_default();

    let mut options = match args.get_one::<String>("options") {
        Some(path) => Options::from_file(path)?,
        None => Options::default(),
    };

    if let Some(pairs) = args.get_many::<String>("PAIRS") {
        let pairs: Vec<&String> = pairs.collect();
        options = options.merge(Options::from_pairs(&pairs)?);
    }

    let mut flags = Options::default();
    if let Some(folder) = args.get_one::<String>("folder") {
        flags.folder = Some(PathBuf::from(folder));
    }
    if let Some(combine) = args.get_one::<String>("combine") {
        flags.combine = Some(combine.parse()?);
    }
    if let Some(fs) = args.get_one::<String>("fs") {
        let fs = fs
            .parse::<u32>()
            .map_err(|_| MixgenError::Configuration(format!("invalid --fs value: {}", fs)))?;
        flags.fs = Some(fs);
    }

    Ok(Inputs {
        targets,
        interferers,
        options: options.merge(flags),
    })
}
