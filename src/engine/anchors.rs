//! SSD anchor grid for the 192x192 palm detection model.
//!
//! The model was exported without its anchor layer, so the grid is rebuilt
//! here with the exporter's configuration: four layers with strides
//! [8, 16, 16, 16], two anchors per cell per layer, anchor offset 0.5,
//! fixed anchor size. Layers sharing a stride collapse onto one feature map.

const INPUT_SIZE: u32 = 192;
const STRIDES: [u32; 4] = [8, 16, 16, 16];
const ANCHORS_PER_LAYER: usize = 2;

pub const NUM_ANCHORS: usize = 2016;

/// Normalized (x, y) anchor centers, in the order the model emits its
/// per-anchor predictions.
pub fn generate_anchors() -> Vec<[f32; 2]> {
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    let mut layer = 0;
    while layer < STRIDES.len() {
        let stride = STRIDES[layer];
        let mut repeats = 0;
        while layer + repeats < STRIDES.len() && STRIDES[layer + repeats] == stride {
            repeats += 1;
        }

        let cells = (INPUT_SIZE / stride) as usize;
        let per_cell = ANCHORS_PER_LAYER * repeats;
        for y in 0..cells {
            for x in 0..cells {
                let cx = (x as f32 + 0.5) / cells as f32;
                let cy = (y as f32 + 0.5) / cells as f32;
                for _ in 0..per_cell {
                    anchors.push([cx, cy]);
                }
            }
        }

        layer += repeats;
    }

    anchors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_count_matches_model_output() {
        // 24*24 cells * 2 + 12*12 cells * 6
        assert_eq!(generate_anchors().len(), NUM_ANCHORS);
    }

    #[test]
    fn anchors_are_normalized_cell_centers() {
        let anchors = generate_anchors();
        assert_eq!(anchors[0], [0.5 / 24.0, 0.5 / 24.0]);
        assert_eq!(anchors[1], anchors[0]);
        for [x, y] in &anchors {
            assert!(*x > 0.0 && *x < 1.0);
            assert!(*y > 0.0 && *y < 1.0);
        }
    }

    #[test]
    fn stride_16_grid_starts_after_stride_8_grid() {
        let anchors = generate_anchors();
        let first_coarse = 24 * 24 * 2;
        assert_eq!(anchors[first_coarse], [0.5 / 12.0, 0.5 / 12.0]);
    }
}
