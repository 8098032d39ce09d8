//! Draw a random corridor, slice it, and print the assembled problem sizes.
//!
//! Usage:
//!   cargo run -p trajgen --example assemble_random -- [seed] [slices]
//!
//! Prints one line per stage: corridor, QP blocks, NLP dimensions.

use trajgen::api::{
    construct_a_matrix, construct_p_matrix, draw_corridor, nlp_dims, slice_corridor,
    CorridorCfg, CostModel, ReplayToken, Triangle,
};

fn main() {
    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(2025u64);
    let slices = args.next().and_then(|s| s.parse().ok()).unwrap_or(3usize);

    let cfg = CorridorCfg {
        segments: 5,
        limit_velocity: true,
        limit_acceleration: true,
        ..CorridorCfg::default()
    };
    let mut p = match draw_corridor(cfg, ReplayToken { seed, index: 0 }) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("draw failed: {e}");
            return;
        }
    };
    println!(
        "corridor: segments={} total_time={:.3}",
        p.segments(),
        p.total_time()
    );

    let dirs: Vec<char> = ['x', 'y', 'z'].iter().copied().cycle().take(p.segments()).collect();
    match slice_corridor(&mut p, &dirs, slices) {
        Ok(grown) => println!(
            "sliced: segments={} dirs={}",
            p.segments(),
            grown.iter().collect::<String>()
        ),
        Err(e) => eprintln!("slice failed: {e}"),
    }

    let times: Vec<f64> = p.corridor.iter().map(|b| b.t).collect();
    let pm = construct_p_matrix(&CostModel::of(&p), &times, Triangle::Lower);
    let lc = construct_a_matrix(&p);
    println!(
        "qp: n_var={} p_nnz={} n_con={} a_nnz={} eq={} ineq={}",
        lc.n_var,
        pm.nnz(),
        lc.n_con,
        lc.n_nnz,
        lc.equality_rows(),
        lc.inequality_rows()
    );
    let (nf, ng) = nlp_dims(&p);
    println!("nlp: nF={nf} nG={ng}");
}
