use clap::Parser;
use clap::ValueEnum;
use tabdict::Config;
use tabdict::HashKind;
use tabdict::HashMap;
use tabdict::ProbeKind;
use tabdict::stats::print_histogram;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum HashArg {
    Polynomial,
    Tabulation,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ProbeArg {
    Perturbation,
    Linear,
}

#[derive(Parser, Debug)]
struct Args {
    /// Number of keys to insert.
    #[arg(short = 'n', long = "entries", default_value_t = 1000)]
    entries: usize,

    #[arg(long = "hash", value_enum, default_value_t = HashArg::Polynomial)]
    hash: HashArg,

    #[arg(long = "probe", value_enum, default_value_t = ProbeArg::Perturbation)]
    probe: ProbeArg,

    /// Seed for the hash secret and random tables. Uses OS entropy if unset.
    #[arg(short = 's', long = "seed")]
    seed: Option<u64>,

    /// Delete every n-th key after filling, leaving tombstones behind.
    #[arg(short = 'd', long = "delete_every")]
    delete_every: Option<usize>,
}

fn main() -> tabdict::Result<()> {
    let args = Args::parse();

    let mut config = Config::default()
        .hash(match args.hash {
            HashArg::Polynomial => HashKind::Polynomial,
            HashArg::Tabulation => HashKind::Tabulation,
        })
        .probe(match args.probe {
            ProbeArg::Perturbation => ProbeKind::Perturbation,
            ProbeArg::Linear => ProbeKind::Linear,
        })
        .instrumented(true);
    if let Some(seed) = args.seed {
        config = config.seed(seed);
    }

    println!(
        "Filling dictionary with {} keys ({:?} hash, {:?} probing)",
        args.entries, args.hash, args.probe
    );

    let mut map = HashMap::with_config(&config)?;
    for i in 0..args.entries {
        map.insert(format!("6.{i}"), i)?;
    }

    if let Some(every) = args.delete_every.filter(|&n| n > 0) {
        let mut deleted = 0;
        for i in (0..args.entries).step_by(every) {
            map.remove(&format!("6.{i}"))?;
            deleted += 1;
        }
        println!("Deleted {deleted} keys");
    }

    map.dict().reset_stats();
    for i in 0..args.entries {
        map.get(&format!("6.{i}"))?;
    }

    println!("{}", map.stats());
    map.dict().layout_stats().print();
    print_histogram(&map.dict().probe_length_histogram());

    if map.size() <= 128 {
        println!("Occupancy: {}", map.dict().occupancy_map());
    }

    Ok(())
}
