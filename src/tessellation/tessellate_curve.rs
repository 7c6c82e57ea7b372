use tracing::debug;

use crate::attribute::share_opt;
use crate::error::{Result, TessellationError};
use crate::geometry::NurbsCurve;

use super::adaptive::{subdivide_adaptive, ScreenSpaceMetric, WorldSpaceMetric};
use super::constant::{span_boundaries, subdivide_constant};
use super::{Polyline, SubdivisionPolicy, TessellationConfig};

/// Tessellates a NURB curve into a polyline.
#[derive(Debug)]
pub struct TessellateCurve<'a> {
    curve: &'a NurbsCurve,
    policy: SubdivisionPolicy,
    config: TessellationConfig,
}

impl<'a> TessellateCurve<'a> {
    /// Creates a new `TessellateCurve` operation with the default config.
    #[must_use]
    pub fn new(curve: &'a NurbsCurve, policy: SubdivisionPolicy) -> Self {
        Self {
            curve,
            policy,
            config: TessellationConfig::default(),
        }
    }

    /// Replaces the tessellation limits.
    #[must_use]
    pub fn with_config(mut self, config: TessellationConfig) -> Self {
        self.config = config;
        self
    }

    /// Executes the tessellation, returning a polyline of at least two
    /// vertices that shares the curve's attribute set.
    ///
    /// Order-2 curves are emitted as their span boundaries under every
    /// policy, since they are already straight between knots.
    ///
    /// # Errors
    ///
    /// Returns an error if the policy parameter is not finite, allocation
    /// fails, or the vertex limit is exceeded. A view transform that maps
    /// samples to non-finite window coordinates is rejected as invalid. No
    /// partial polyline is returned.
    pub fn execute(&self) -> Result<Polyline> {
        let config = &self.config;
        let vertices = match self.policy {
            SubdivisionPolicy::Constant { segments_per_span } => {
                let segments = self.segment_count(segments_per_span)?;
                if self.curve.is_piecewise_linear() {
                    span_boundaries(self.curve, config)?
                } else {
                    subdivide_constant(self.curve, segments, config)?
                }
            }
            SubdivisionPolicy::WorldSpace { max_chord } => {
                let threshold = clamp_threshold(max_chord, config.min_world_threshold)?;
                if self.curve.is_piecewise_linear() {
                    span_boundaries(self.curve, config)?
                } else {
                    subdivide_adaptive(self.curve, &WorldSpaceMetric, threshold, config)?
                }
            }
            SubdivisionPolicy::ScreenSpace { max_pixels, view } => {
                // Window distances are pixel-quantized.
                let threshold = clamp_threshold(max_pixels, config.min_screen_threshold)?.trunc();
                if self.curve.is_piecewise_linear() {
                    span_boundaries(self.curve, config)?
                } else {
                    let metric = ScreenSpaceMetric::new(view.world_to_window());
                    subdivide_adaptive(self.curve, &metric, threshold, config)?
                }
            }
        };

        debug!(
            method = ?self.policy.method(),
            order = self.curve.order(),
            points = self.curve.num_points(),
            vertices = vertices.len(),
            "tessellated NURB curve"
        );

        Ok(Polyline {
            vertices,
            attributes: share_opt(self.curve.attributes()),
        })
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn segment_count(&self, segments_per_span: f64) -> Result<usize> {
        if !segments_per_span.is_finite() {
            return Err(TessellationError::InvalidParameters(format!(
                "segments per span must be finite, got {segments_per_span}"
            ))
            .into());
        }
        let segments = segments_per_span.floor();
        if segments < 1.0 {
            debug!(segments_per_span, "clamping constant subdivision to 1 segment");
            return Ok(1);
        }
        if segments > self.config.max_vertices as f64 {
            return Err(TessellationError::VertexLimitExceeded {
                limit: self.config.max_vertices,
            }
            .into());
        }
        Ok(segments as usize)
    }
}

fn clamp_threshold(value: f64, min: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(TessellationError::InvalidParameters(format!(
            "subdivision threshold must be finite, got {value}"
        ))
        .into());
    }
    if value < min {
        debug!(value, min, "clamping subdivision threshold");
        return Ok(min);
    }
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::FRAC_1_SQRT_2;

    use approx::assert_relative_eq;

    use super::*;
    use crate::attribute::{AttributeKind, AttributeSet, AttributeValue, SharedAttributes};
    use crate::error::NurblineError;
    use crate::math::{Matrix4, Point3, RationalPoint4, Vector3};
    use crate::tessellation::ViewTransform;

    fn quarter_circle(radius: f64) -> NurbsCurve {
        let w = FRAC_1_SQRT_2;
        NurbsCurve::new(
            3,
            vec![
                RationalPoint4::new(radius, 0.0, 0.0, 1.0),
                RationalPoint4::new(radius * w, radius * w, 0.0, w),
                RationalPoint4::new(0.0, radius, 0.0, 1.0),
            ],
            vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
        )
        .unwrap()
    }

    /// A planar cubic with three spans and a double knot.
    fn s_curve(scale: f64) -> NurbsCurve {
        let pts = [
            (0.0, 0.0, 1.0),
            (1.0, 2.0, 1.0),
            (2.0, -1.0, 2.0),
            (3.0, 2.0, 1.0),
            (4.0, 0.0, 0.5),
            (5.0, 1.0, 1.0),
            (6.0, 0.0, 1.0),
        ];
        let control_points = pts
            .iter()
            .map(|&(x, y, w)| RationalPoint4::new(x * scale * w, y * scale * w, 0.0, w))
            .collect();
        NurbsCurve::new(
            4,
            control_points,
            vec![0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 3.0],
        )
        .unwrap()
    }

    fn line() -> NurbsCurve {
        NurbsCurve::new(
            2,
            vec![
                RationalPoint4::new(-5.0, 1.0, 2.0, 1.0),
                RationalPoint4::new(10.0, 6.0, -4.0, 2.0),
            ],
            vec![0.0, 0.0, 1.0, 1.0],
        )
        .unwrap()
    }

    fn run(curve: &NurbsCurve, policy: SubdivisionPolicy) -> Polyline {
        TessellateCurve::new(curve, policy).execute().unwrap()
    }

    #[test]
    fn constant_single_span_ends_exactly_on_closing_knot() {
        let curve = quarter_circle(1.0);
        let polyline = run(&curve, SubdivisionPolicy::Constant { segments_per_span: 4.0 });
        assert_eq!(polyline.len(), 5);
        assert_eq!(polyline.vertices[4].point, curve.point_at(1.0).unwrap());
        for p in polyline.points() {
            assert_relative_eq!(p.coords.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn constant_truncates_fractional_segments() {
        let curve = s_curve(1.0);
        // Spans: [0,1], [1,2], [2,3].
        let polyline = run(&curve, SubdivisionPolicy::Constant { segments_per_span: 2.9 });
        assert_eq!(polyline.len(), 3 * 2 + 1);
        assert_eq!(polyline.vertices[2].point, curve.point_at(1.0).unwrap());
    }

    #[test]
    fn constant_below_one_still_emits_span_ends() {
        let curve = quarter_circle(1.0);
        let polyline = run(&curve, SubdivisionPolicy::Constant { segments_per_span: 0.2 });
        assert_eq!(polyline.len(), 2);
    }

    #[test]
    fn world_space_chords_within_threshold() {
        let curve = s_curve(3.0);
        let threshold = 0.4;
        let polyline = run(&curve, SubdivisionPolicy::WorldSpace { max_chord: threshold });
        assert!(polyline.len() > 10);
        for w in polyline.vertices.windows(2) {
            let d2 = (w[1].point - w[0].point).norm_squared();
            assert!(d2 <= threshold * threshold + 1e-9);
        }
        assert_eq!(polyline.vertices[0].point, curve.point_at(0.0).unwrap());
        assert_eq!(
            polyline.vertices[polyline.len() - 1].point,
            curve.point_at(3.0).unwrap()
        );
    }

    #[test]
    fn world_space_tracks_circle() {
        let curve = quarter_circle(10.0);
        let polyline = run(&curve, SubdivisionPolicy::WorldSpace { max_chord: 0.5 });
        for p in polyline.points() {
            assert_relative_eq!(p.coords.norm(), 10.0, epsilon = 1e-9);
        }
        // Arc length 5*pi needs at least 32 chords of length 0.5.
        assert!(polyline.len() >= 33);
        assert!(polyline.length() <= 5.0 * std::f64::consts::PI);
    }

    #[test]
    fn world_space_threshold_is_clamped() {
        let curve = quarter_circle(0.01);
        let tiny = run(&curve, SubdivisionPolicy::WorldSpace { max_chord: 0.0 });
        let floor = run(&curve, SubdivisionPolicy::WorldSpace { max_chord: 0.001 });
        assert_eq!(tiny.len(), floor.len());
    }

    #[test]
    fn linear_curve_yields_endpoints_under_every_policy() {
        let curve = line();
        let view = ViewTransform::identity();
        let policies = [
            SubdivisionPolicy::Constant { segments_per_span: 4.0 },
            SubdivisionPolicy::WorldSpace { max_chord: 0.01 },
            SubdivisionPolicy::ScreenSpace { max_pixels: 1.0, view },
        ];
        for policy in policies {
            let polyline = run(&curve, policy);
            assert_eq!(polyline.len(), 2);
            assert!((polyline.vertices[0].point - Point3::new(-5.0, 1.0, 2.0)).norm() < 1e-12);
            assert!((polyline.vertices[1].point - Point3::new(5.0, 3.0, -2.0)).norm() < 1e-12);
        }
    }

    #[test]
    fn screen_space_under_identity_matches_world_space() {
        let curve = s_curve(20.0);
        let world = run(&curve, SubdivisionPolicy::WorldSpace { max_chord: 2.0 });
        let screen = run(
            &curve,
            SubdivisionPolicy::ScreenSpace {
                max_pixels: 2.0,
                view: ViewTransform::identity(),
            },
        );
        assert!(world.len() > 10);
        assert_eq!(world.len(), screen.len());
        for (a, b) in world.points().zip(screen.points()) {
            assert!((a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn screen_space_truncates_pixel_threshold() {
        let curve = s_curve(20.0);
        let view = ViewTransform::identity();
        let fractional = run(&curve, SubdivisionPolicy::ScreenSpace { max_pixels: 2.7, view });
        let whole = run(&curve, SubdivisionPolicy::ScreenSpace { max_pixels: 2.0, view });
        assert_eq!(fractional.len(), whole.len());
    }

    #[test]
    fn screen_space_clamps_sub_pixel_threshold() {
        let curve = s_curve(10.0);
        let view = ViewTransform::identity();
        let sub_pixel = run(&curve, SubdivisionPolicy::ScreenSpace { max_pixels: 0.3, view });
        let one_pixel = run(&curve, SubdivisionPolicy::ScreenSpace { max_pixels: 1.0, view });
        assert_eq!(sub_pixel.len(), one_pixel.len());
        for (a, b) in sub_pixel.points().zip(one_pixel.points()) {
            assert_eq!(a, b);
        }
        for w in sub_pixel.vertices.windows(2) {
            assert!((w[1].point - w[0].point).norm() <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn world_space_terminates_across_a_break() {
        // Full-multiplicity interior knot: the two spans do not meet.
        let curve = NurbsCurve::new(
            3,
            vec![
                RationalPoint4::new(0.0, 0.0, 0.0, 1.0),
                RationalPoint4::new(1.0, 1.0, 0.0, 1.0),
                RationalPoint4::new(2.0, 0.0, 0.0, 1.0),
                RationalPoint4::new(4.0, 0.0, 0.0, 1.0),
                RationalPoint4::new(5.0, 1.0, 0.0, 1.0),
                RationalPoint4::new(6.0, 0.0, 0.0, 1.0),
            ],
            vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0],
        )
        .unwrap();
        let threshold = 0.05;
        let polyline = run(&curve, SubdivisionPolicy::WorldSpace { max_chord: threshold });

        let first = polyline.vertices.first().unwrap().point;
        let last = polyline.vertices.last().unwrap().point;
        assert_eq!(first, curve.point_at(0.0).unwrap());
        assert_eq!(last, curve.point_at(2.0).unwrap());

        // The break is bridged through the blended point at u = 1, so at most
        // two chords exceed the threshold, each spanning half the gap.
        let long: Vec<f64> = polyline
            .vertices
            .windows(2)
            .map(|w| (w[1].point - w[0].point).norm())
            .filter(|&d| d > threshold + 1e-9)
            .collect();
        assert!(!long.is_empty() && long.len() <= 2, "long chords: {long:?}");
        for d in long {
            assert!(d <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn screen_space_follows_window_scale() {
        let curve = s_curve(1.0);
        let view = ViewTransform::new(
            Matrix4::new_nonuniform_scaling(&Vector3::new(50.0, 50.0, 1.0)),
            Matrix4::new_translation(&Vector3::new(320.0, 240.0, 0.0)),
        );
        let polyline = run(&curve, SubdivisionPolicy::ScreenSpace { max_pixels: 4.0, view });
        let m = view.world_to_window();
        let window: Vec<_> = polyline.points().map(|p| m.transform_point(p)).collect();
        for w in window.windows(2) {
            let d2 = (w[1].x - w[0].x).powi(2) + (w[1].y - w[0].y).powi(2);
            assert!(d2 <= 16.0 + 1e-6);
        }
    }

    #[test]
    fn non_finite_parameters_are_rejected() {
        let curve = quarter_circle(1.0);
        for policy in [
            SubdivisionPolicy::Constant {
                segments_per_span: f64::NAN,
            },
            SubdivisionPolicy::WorldSpace {
                max_chord: f64::INFINITY,
            },
        ] {
            let err = TessellateCurve::new(&curve, policy).execute().unwrap_err();
            assert!(matches!(
                err,
                NurblineError::Tessellation(TessellationError::InvalidParameters(_))
            ));
        }
    }

    #[test]
    fn runaway_subdivision_hits_vertex_limit() {
        let curve = quarter_circle(100.0);
        let config = TessellationConfig::default().with_max_vertices(16);
        let err = TessellateCurve::new(&curve, SubdivisionPolicy::WorldSpace { max_chord: 0.01 })
            .with_config(config)
            .execute()
            .unwrap_err();
        assert!(matches!(
            err,
            NurblineError::Tessellation(TessellationError::VertexLimitExceeded { limit: 16 })
        ));
    }

    #[test]
    fn polyline_shares_curve_attributes() {
        let mut set = AttributeSet::new();
        set.insert(
            AttributeKind::DiffuseColor,
            AttributeValue::Color(Vector3::new(0.0, 0.5, 1.0)),
        );
        let attrs = SharedAttributes::new(set);
        let mut curve = quarter_circle(1.0);
        curve.set_attributes(Some(attrs.share()));

        let polyline = run(&curve, SubdivisionPolicy::Constant { segments_per_span: 3.0 });
        assert!(polyline.attributes.as_ref().unwrap().ptr_eq(&attrs));
        assert!(polyline.vertices.iter().all(|v| v.attributes.is_none()));
    }
}
