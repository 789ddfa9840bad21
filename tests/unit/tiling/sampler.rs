//! Tests for bounds-checked patch extraction and batch stacking

#[cfg(test)]
mod tests {
    use ndarray::{Array, Array2, Array3, IxDyn, arr2, s};
    use patchmaker::PatchError;
    use patchmaker::tiling::coords::{Coord, generate};
    use patchmaker::tiling::sampler::{sample_patches, spatial_shape, stack_patches};

    fn ramp(rows: usize, cols: usize) -> Array2<f64> {
        Array2::from_shape_fn((rows, cols), |(r, c)| (r * cols + c) as f64)
    }

    // Tests patches are the expected windows in coordinate order
    // Verified by swapping row and column offsets
    #[test]
    fn test_sample_patches_windows() {
        let image = ramp(4, 5);
        let coords = vec![Coord::new(0, 0), Coord::new(2, 3), Coord::new(1, 1)];

        let patches = sample_patches(&coords, &image, (2, 2)).unwrap();

        assert_eq!(patches.len(), 3);
        assert_eq!(patches[0], arr2(&[[0.0, 1.0], [5.0, 6.0]]));
        assert_eq!(patches[1], arr2(&[[13.0, 14.0], [18.0, 19.0]]));
        assert_eq!(patches[2], image.slice(s![1..3, 1..3]));
    }

    // Tests patches are independent copies of the source
    // Verified by returning views instead of owned arrays
    #[test]
    fn test_sample_patches_copy_semantics() {
        let image = ramp(3, 3);
        let mut patches = sample_patches(&[Coord::new(0, 0)], &image, (2, 2)).unwrap();

        patches[0].fill(-1.0);

        assert_eq!(image[[0, 0]], 0.0);
        assert_eq!(image[[1, 1]], 4.0);
    }

    // Tests trailing channel axes are carried through unchanged
    // Verified by slicing the channel axis with the patch width
    #[test]
    fn test_sample_patches_multichannel() {
        let image = Array3::from_shape_fn((6, 6, 3), |(r, c, ch)| (r * 100 + c * 10 + ch) as f32);
        let coords = generate((6, 6), (4, 4), 2).unwrap().to_vec();

        let patches = sample_patches(&coords, &image, (4, 4)).unwrap();

        assert_eq!(patches.len(), 4);
        for (patch, coord) in patches.iter().zip(&coords) {
            assert_eq!(patch.dim(), (4, 4, 3));
            assert_eq!(
                patch[[1, 2, 2]],
                ((coord.row + 1) * 100 + (coord.col + 2) * 10 + 2) as f32
            );
        }
    }

    // Tests dynamic-dimension images sample like static ones
    // Verified by requiring a fixed dimensionality
    #[test]
    fn test_sample_patches_dynamic_dimension() {
        let image = Array::from_shape_fn(IxDyn(&[5, 4, 2]), |idx| (idx[0] + idx[1] + idx[2]) as f64);

        let patches = sample_patches(&[Coord::new(3, 2)], &image, (2, 2)).unwrap();

        assert_eq!(patches[0].shape(), &[2, 2, 2]);
        assert_eq!(patches[0][IxDyn(&[1, 1, 1])], 4.0 + 3.0 + 1.0);
    }

    // Tests an out-of-bounds anchor is named in the error
    // Verified by clamping the window instead of failing
    #[test]
    fn test_sample_patches_out_of_bounds() {
        let image = ramp(10, 10);
        let coords = vec![Coord::new(0, 0), Coord::new(7, 2), Coord::new(9, 9)];

        let err = sample_patches(&coords, &image, (4, 4)).unwrap_err();

        match err {
            PatchError::OutOfBounds {
                coord,
                patch_shape,
                image_shape,
            } => {
                assert_eq!(coord, Coord::new(7, 2));
                assert_eq!(patch_shape, (4, 4));
                assert_eq!(image_shape, (10, 10));
            }
            other => panic!("Expected OutOfBounds, got {other}"),
        }
    }

    // Tests one-dimensional images and empty patches are rejected
    // Verified by removing the axis count check
    #[test]
    fn test_sample_patches_invalid_geometry() {
        let line = Array::from_shape_fn(IxDyn(&[10]), |idx| idx[0] as f64);
        assert!(matches!(
            sample_patches(&[Coord::new(0, 0)], &line, (1, 1)),
            Err(PatchError::InvalidGeometry { parameter: "ndim", .. })
        ));

        let image = ramp(3, 3);
        assert!(matches!(
            sample_patches(&[Coord::new(0, 0)], &image, (0, 2)),
            Err(PatchError::InvalidGeometry { .. })
        ));
        assert!(spatial_shape(&line).is_err());
        assert_eq!(spatial_shape(&image).unwrap(), (3, 3));
    }

    // Tests stacking builds a leading batch axis
    // Verified by stacking along the last axis
    #[test]
    fn test_stack_patches() {
        let image = ramp(4, 4);
        let coords = generate((4, 4), (2, 2), 2).unwrap().to_vec();
        let patches = sample_patches(&coords, &image, (2, 2)).unwrap();

        let batch = stack_patches(&patches).unwrap();

        assert_eq!(batch.dim(), (4, 2, 2));
        assert_eq!(batch.slice(s![3, .., ..]), patches[3]);
    }

    // Tests stacking rejects empty and mismatched inputs
    // Verified by returning an empty batch
    #[test]
    fn test_stack_patches_errors() {
        let empty: Vec<Array2<f64>> = Vec::new();
        assert!(matches!(
            stack_patches(&empty),
            Err(PatchError::InvalidGeometry { .. })
        ));

        let mixed = vec![Array2::<f64>::zeros((2, 2)), Array2::zeros((3, 2))];
        assert!(matches!(
            stack_patches(&mixed),
            Err(PatchError::Shape { .. })
        ));
    }

    // Tests an anchor at the top of the index range fails cleanly
    // Verified by summing anchor and patch extent unchecked
    #[test]
    fn test_sample_patches_overflowing_anchor() {
        let image = Array2::<f64>::zeros((10, 10));

        let result = sample_patches(&[Coord::new(usize::MAX, 0)], &image, (2, 2));

        assert!(matches!(
            result,
            Err(PatchError::OutOfBounds { coord, .. }) if coord == Coord::new(usize::MAX, 0)
        ));
    }
}
