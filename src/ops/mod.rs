// ============================================================================
// OPS - whole-buffer pixel operations
// ============================================================================
//
//   fill.rs       - exact-match 4-connected flood fill
//   brush.rs      - round-capped stroke rasterizer
//   transform.rs  - nearest / bilinear scaling used by resize
// ============================================================================

pub mod brush;
pub mod fill;
pub mod transform;
