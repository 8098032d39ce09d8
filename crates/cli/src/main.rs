use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use nalgebra::DVector;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;
use trajgen::api::{
    construct_a_matrix, construct_p_matrix, draw_corridor, nlp_dims, slice_corridor,
    time_gradient, AssemblyCfg, CorridorCfg, CostModel, LinearConstr, ReplayToken,
    SparseTriplets, TgProblem, Trajectory, Triangle,
};

mod provenance;

use provenance::{write_sidecar, Payload};

#[derive(Parser)]
#[command(name = "trajgen-cli")]
#[command(about = "Corridor trajectory problems: generate, slice, assemble, gradient, sample")]
struct Cmd {
    /// Log at debug level (slicing steps, active duals)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Draw a random corridor problem and write it as JSON
    Generate {
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 0)]
        index: u64,
        #[arg(long, default_value_t = 4)]
        segments: usize,
        #[arg(long, default_value_t = 5)]
        order: usize,
        #[arg(long, default_value_t = 3.0)]
        minimize_order: f64,
        #[arg(long)]
        limit_velocity: bool,
        #[arg(long)]
        limit_acceleration: bool,
        #[arg(long)]
        out: PathBuf,
    },
    /// Split middle boxes round-robin to add segments
    Slice {
        #[arg(long)]
        input: PathBuf,
        /// One axis letter per box, e.g. `xyyx`
        #[arg(long)]
        dirs: String,
        #[arg(long)]
        times: usize,
        #[arg(long)]
        out: PathBuf,
    },
    /// Write the QP blocks (P, A, bounds) and NLP sizes as JSON
    Assemble {
        #[arg(long)]
        input: PathBuf,
        /// Stored triangle of P: l, u or f
        #[arg(long, default_value = "l")]
        triangle: Triangle,
        #[arg(long)]
        out: PathBuf,
    },
    /// Per-segment time gradient from a solver's primal/dual answer
    Gradient {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        solution: PathBuf,
        #[arg(long, default_value_t = 0.0)]
        tf_weight: f64,
        #[arg(long)]
        out: PathBuf,
    },
    /// Sample the trajectory of a solution to CSV (t, x, y, z)
    Sample {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        solution: PathBuf,
        #[arg(long, default_value_t = 100)]
        n: usize,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print a small provenance JSON block
    Report,
}

/// Solver answer as stored on disk; duals are only needed for gradients.
#[derive(Deserialize)]
struct SolutionFile {
    sol: Vec<f64>,
    #[serde(default)]
    lmdy: Vec<f64>,
    #[serde(default)]
    lmdz: Vec<f64>,
}

#[derive(Serialize)]
struct Assembled<'a> {
    p: &'a SparseTriplets,
    a: &'a LinearConstr,
    nlp_rows: usize,
    nlp_jac_nnz: usize,
}

fn main() -> Result<()> {
    let cmd = Cmd::parse();
    let level = if cmd.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(level)
        .init();
    match cmd.action {
        Action::Generate {
            seed,
            index,
            segments,
            order,
            minimize_order,
            limit_velocity,
            limit_acceleration,
            out,
        } => {
            let cfg = CorridorCfg {
                segments,
                traj_order: order,
                minimize_order,
                limit_velocity,
                limit_acceleration,
                ..CorridorCfg::default()
            };
            generate(cfg, ReplayToken { seed, index }, &out)
        }
        Action::Slice {
            input,
            dirs,
            times,
            out,
        } => slice(&input, &dirs, times, &out),
        Action::Assemble {
            input,
            triangle,
            out,
        } => assemble(&input, triangle, &out),
        Action::Gradient {
            input,
            solution,
            tf_weight,
            out,
        } => gradient(&input, &solution, tf_weight, &out),
        Action::Sample {
            input,
            solution,
            n,
            out,
        } => sample(&input, &solution, n, &out),
        Action::Report => report(),
    }
}

fn load_problem(path: &Path) -> Result<TgProblem> {
    let p = TgProblem::load_from_file(path)?;
    p.validate()
        .with_context(|| format!("invalid problem in {}", path.display()))?;
    Ok(p)
}

fn load_solution(path: &Path) -> Result<SolutionFile> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}

fn write_json<T: Serialize>(out: &Path, value: &T) -> Result<()> {
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(out, serde_json::to_vec_pretty(value)?)
        .with_context(|| format!("writing {}", out.display()))
}

fn generate(cfg: CorridorCfg, tok: ReplayToken, out: &Path) -> Result<()> {
    let p = draw_corridor(cfg, tok)?;
    p.save_to_file(out)?;
    tracing::info!(
        segments = p.segments(),
        total_time = p.total_time(),
        out = %out.display(),
        "generate"
    );
    write_sidecar(
        out,
        Payload::new(serde_json::json!({
            "seed": tok.seed,
            "index": tok.index,
            "segments": cfg.segments,
            "order": cfg.traj_order,
            "minimize_order": cfg.minimize_order,
            "limit_velocity": cfg.limit_velocity,
            "limit_acceleration": cfg.limit_acceleration,
        })),
    )?;
    Ok(())
}

fn slice(input: &Path, dirs: &str, times: usize, out: &Path) -> Result<()> {
    let mut p = load_problem(input)?;
    let dirs: Vec<char> = dirs.chars().collect();
    let grown = slice_corridor(&mut p, &dirs, times)?;
    p.save_to_file(out)?;
    let grown: String = grown.into_iter().collect();
    tracing::info!(segments = p.segments(), dirs = %grown, "slice");
    write_sidecar(
        out,
        Payload::new(serde_json::json!({ "times": times, "dirs": grown })).with_input(input),
    )?;
    Ok(())
}

fn assemble(input: &Path, triangle: Triangle, out: &Path) -> Result<()> {
    let p = load_problem(input)?;
    let times: Vec<f64> = p.corridor.iter().map(|b| b.t).collect();
    let pm = construct_p_matrix(&CostModel::of(&p), &times, triangle);
    let a = construct_a_matrix(&p);
    let (nlp_rows, nlp_jac_nnz) = nlp_dims(&p);
    tracing::info!(
        n_var = a.n_var,
        n_con = a.n_con,
        p_nnz = pm.nnz(),
        a_nnz = a.n_nnz,
        nlp_rows,
        nlp_jac_nnz,
        "assemble"
    );
    write_json(
        out,
        &Assembled {
            p: &pm,
            a: &a,
            nlp_rows,
            nlp_jac_nnz,
        },
    )?;
    write_sidecar(
        out,
        Payload::new(serde_json::json!({ "triangle": format!("{triangle:?}") })).with_input(input),
    )?;
    Ok(())
}

fn gradient(input: &Path, solution: &Path, tf_weight: f64, out: &Path) -> Result<()> {
    let p = load_problem(input)?;
    let s = load_solution(solution)?;
    let a = construct_a_matrix(&p);
    if s.sol.len() != a.n_var || s.lmdy.len() != a.n_con || s.lmdz.len() != a.n_var {
        bail!(
            "solution sizes sol={} lmdy={} lmdz={} do not match n_var={} n_con={}",
            s.sol.len(),
            s.lmdy.len(),
            s.lmdz.len(),
            a.n_var,
            a.n_con
        );
    }
    let cfg = AssemblyCfg {
        report_duals: tracing::enabled!(tracing::Level::DEBUG),
        ..AssemblyCfg::default()
    };
    let grad = time_gradient(
        &p,
        &DVector::from_vec(s.sol),
        &DVector::from_vec(s.lmdy),
        &DVector::from_vec(s.lmdz),
        tf_weight,
        &cfg,
    );
    tracing::info!(norm = grad.norm(), "gradient");
    write_json(out, &grad.as_slice())?;
    write_sidecar(
        out,
        Payload::new(serde_json::json!({ "tf_weight": tf_weight }))
            .with_input(input)
            .with_input(solution),
    )?;
    Ok(())
}

fn sample(input: &Path, solution: &Path, n: usize, out: &Path) -> Result<()> {
    let p = load_problem(input)?;
    let s = load_solution(solution)?;
    let traj = Trajectory::from_solution(&p, &DVector::from_vec(s.sol))?;
    let (total, pts) = traj.sample(n);
    let step = if n > 1 { total / (n - 1) as f64 } else { 0.0 };
    let t: Vec<f64> = (0..pts.len()).map(|i| i as f64 * step).collect();
    let mut df = df!(
        "t" => t,
        "x" => pts.iter().map(|q| q.x).collect::<Vec<_>>(),
        "y" => pts.iter().map(|q| q.y).collect::<Vec<_>>(),
        "z" => pts.iter().map(|q| q.z).collect::<Vec<_>>(),
    )?;
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut file = File::create(out).with_context(|| format!("creating {}", out.display()))?;
    CsvWriter::new(&mut file).finish(&mut df)?;
    tracing::info!(rows = df.height(), total_time = total, "sample");
    write_sidecar(
        out,
        Payload::new(serde_json::json!({ "n": n }))
            .with_input(input)
            .with_input(solution),
    )?;
    Ok(())
}

fn report() -> Result<()> {
    let obj = serde_json::json!({
        "code_rev": provenance::current_git_rev(),
        "trajgen_version": trajgen::VERSION,
        "params": {},
        "outputs": []
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}
