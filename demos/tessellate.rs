//! Tessellates a rational quarter circle under each subdivision method.
//!
//! Run with `RUST_LOG=nurbline=debug` to see the tessellation summaries.

use std::f64::consts::FRAC_1_SQRT_2;

use nurbline::geometry::NurbsCurve;
use nurbline::math::{Matrix4, RationalPoint4, Vector3};
use nurbline::store::GeometryStore;
use nurbline::tessellation::{SubdivisionStyle, ViewTransform};
use tracing_subscriber::EnvFilter;

fn main() -> nurbline::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let w = FRAC_1_SQRT_2;
    let quarter = NurbsCurve::new(
        3,
        vec![
            RationalPoint4::new(10.0, 0.0, 0.0, 1.0),
            RationalPoint4::new(10.0 * w, 10.0 * w, 0.0, w),
            RationalPoint4::new(0.0, 10.0, 0.0, 1.0),
        ],
        vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
    )?;

    let mut store = GeometryStore::new();
    let id = store.insert(quarter);
    println!("{}:", store.get(id)?.kind().name());

    // 40 pixels per world unit, origin at the window centre.
    let view = ViewTransform::new(
        Matrix4::new_scaling(40.0),
        Matrix4::new_translation(&Vector3::new(400.0, 300.0, 0.0)),
    );

    let styles = [
        ("constant 8", SubdivisionStyle::constant(8.0)),
        ("world 0.5", SubdivisionStyle::world_space(0.5)),
        ("screen 12px", SubdivisionStyle::screen_space(12.0)),
    ];
    for (label, style) in &styles {
        let polyline = store.polyline(id, style, Some(&view))?;
        println!(
            "{label:>12}: {:>3} vertices, length {:.4}",
            polyline.len(),
            polyline.length()
        );
    }

    let copy = store.duplicate(id)?;
    store.edit(copy, |c: &mut NurbsCurve| c.set_knot(5, 2.0))?;
    let polyline = store.polyline(copy, &SubdivisionStyle::constant(8.0), None)?;
    println!("{:>12}: {:>3} vertices", "edited copy", polyline.len());

    Ok(())
}
