use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{bail, Context};
use baker::{build_cluster_dag, DagConfig};
use clap::Parser;
use common::{Asset, TriMesh};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Bake meshes into cluster hierarchies for virtualized geometry rendering
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Mesh file, or glob of mesh files (.glb, .gltf, .obj)
    input: String,

    /// Directory to write `<mesh name>.bin` files into
    #[arg(short, long, default_value = "baked")]
    output: PathBuf,

    /// Maximum triangles per cluster
    #[arg(long, default_value_t = baker::CLUSTER_SIZE)]
    cluster_size: usize,

    /// Maximum clusters per group
    #[arg(long, default_value_t = baker::GROUP_SIZE)]
    group_size: usize,

    /// Also write every cluster as an object of `<mesh name>.obj`, for inspection
    #[arg(long)]
    obj: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = DagConfig {
        cluster_size: args.cluster_size,
        group_size: args.group_size,
        ..Default::default()
    };
    config.validate()?;

    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    let mut baked = 0;
    let mut failed = 0;

    for entry in glob::glob(&args.input).context("Invalid input pattern")? {
        let result = entry
            .context("Failed to read input path")
            .and_then(|path| bake(&path, &args, &config));

        match result {
            Ok(()) => baked += 1,
            Err(e) => {
                log::error!("{e:#}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} meshes failed to bake", baked + failed);
    }
    if baked == 0 {
        bail!("No meshes match {}", args.input);
    }

    Ok(())
}

fn bake(path: &Path, args: &Args, config: &DagConfig) -> anyhow::Result<()> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .context("Mesh path has no file name")?
        .to_owned();

    log::info!("Baking {}", path.display());
    let start = Instant::now();

    let mesh = TriMesh::load(path).with_context(|| format!("Failed to load {}", path.display()))?;

    let multi_res = build_cluster_dag(&name, &mesh.verts, &mesh.indices, config)
        .with_context(|| format!("Failed to build hierarchy for {}", path.display()))?;

    multi_res
        .validate(config.cluster_size)
        .with_context(|| format!("Invalid hierarchy for {}", path.display()))?;

    log::info!(
        "Baked {name} in {:.2?}: {} triangles, {} clusters, {} groups, {} levels",
        start.elapsed(),
        mesh.num_tris(),
        multi_res.clusters.len(),
        multi_res.groups.len(),
        multi_res.max_mip_level() + 1,
    );

    let out = args.output.join(format!("{name}.bin"));
    multi_res
        .save(&out)
        .with_context(|| format!("Failed to write {}", out.display()))?;

    if args.obj {
        let out = args.output.join(format!("{name}.obj"));
        multi_res
            .to_obj()
            .save(&out)
            .with_context(|| format!("Failed to write {}", out.display()))?;
    }

    Ok(())
}
