//! Pipeline steps producing the distributable bundles of a package.

use anyhow::{Result, anyhow};
use log::info;

use crate::{
    bundle::rollup_bundle_file, context::BuildContext, engine::BundleEngine, types::BundleFormat,
};

/// Flattens the ES2015 build into a single ES module at
/// `<dest>/<flatModuleFile>.js` and records it as the FESM artefact.
pub async fn flatten_to_fesm<E: BundleEngine>(ctx: &mut BuildContext, engine: &E) -> Result<()> {
    info!("Flattening {} to a flat ES module", ctx.entry_point.module_id);

    let opts = ctx.bundle_options(
        &ctx.entry_point.module_id,
        ctx.entry_point.entry_file.clone(),
        BundleFormat::Es,
        ctx.fesm_dest(),
    );
    let result = rollup_bundle_file(engine, &opts).await?;

    info!("Wrote {}", result.dest.display());
    ctx.artefacts.fesm_bundle_file = Some(result.dest.clone());
    ctx.artefacts.results.push(result);
    Ok(())
}

/// Turns the recorded flat ES module into a UMD bundle at
/// `<dest>/bundles/<flatModuleFile>.umd.js` and records it as the UMD artefact.
pub async fn flatten_to_umd<E: BundleEngine>(ctx: &mut BuildContext, engine: &E) -> Result<()> {
    info!("Bundling {} as UMD", ctx.entry_point.module_id);

    let entry = ctx.artefacts.fesm_bundle_file.clone().ok_or_else(|| {
        anyhow!(
            "No flat ES module bundle of {} to build the UMD bundle from; flatten to FESM first",
            ctx.entry_point.module_id
        )
    })?;

    let opts = ctx.bundle_options(
        &ctx.entry_point.umd_module_id,
        entry,
        BundleFormat::Umd,
        ctx.umd_dest(),
    );
    let result = rollup_bundle_file(engine, &opts).await?;

    info!("Wrote {}", result.dest.display());
    ctx.artefacts.umd_bundle_file = Some(result.dest.clone());
    ctx.artefacts.results.push(result);
    Ok(())
}
