//! Tests for input, label and training batch construction

#[cfg(test)]
mod tests {
    use ndarray::{Array2, Axis, s};
    use patchmaker::PatchError;
    use patchmaker::pipeline::TilingConfig;
    use patchmaker::pipeline::batch::{build_input_batch, build_label_batch, build_training_batch};

    fn gradient(rows: usize, cols: usize) -> Array2<f32> {
        Array2::from_shape_fn((rows, cols), |(r, c)| (r * cols + c) as f32)
    }

    // Tests patches from every image are concatenated in image order
    // Verified by tiling only the first image
    #[test]
    fn test_build_input_batch_counts() {
        let images = vec![gradient(10, 10), gradient(12, 8)];
        let config = TilingConfig::new((4, 4), 4);

        let batch = build_input_batch(&images, &config).unwrap();

        // 3x3 anchors for the first image, 3x2 for the second
        assert_eq!(batch.dim(), (15, 4, 4));
    }

    // Tests each patch is normalized on its own range
    // Verified by normalizing the whole image once
    #[test]
    fn test_build_input_batch_normalizes_per_patch() {
        let images = vec![gradient(8, 8)];
        let config = TilingConfig::new((4, 4), 4);

        let batch = build_input_batch(&images, &config).unwrap();

        for patch in batch.axis_iter(Axis(0)) {
            assert_eq!(patch[[0, 0]], 0.0);
            assert!((patch[[3, 3]] - 1.0).abs() < 1e-6);
        }
    }

    // Tests undersized images fail instead of producing an empty batch
    // Verified by skipping images smaller than a patch
    #[test]
    fn test_build_input_batch_undersized() {
        let images = vec![gradient(3, 3)];
        let empty: Vec<Array2<f32>> = Vec::new();
        let config = TilingConfig::new((4, 4), 2);

        assert!(build_input_batch(&images, &config).is_err());
        assert!(build_input_batch(&empty, &config).is_err());
    }

    // Tests the class count is shared across all label patches
    // Verified by inferring the count per patch
    #[test]
    fn test_build_label_batch_shared_classes() {
        let mut labels = Array2::<u8>::zeros((8, 4));
        labels[[7, 3]] = 2;
        let config = TilingConfig::new((4, 4), 4);

        let batch = build_label_batch(&[labels], &config, None).unwrap();

        assert_eq!(batch.dim(), (2, 4, 4, 3));
        assert_eq!(batch.slice(s![0, .., .., 0]).sum(), 16.0);
        assert_eq!(batch[[1, 3, 3, 2]], 1.0);
    }

    // Tests an explicit class count is respected and checked
    // Verified by ignoring the explicit count
    #[test]
    fn test_build_label_batch_explicit_classes() {
        let labels = Array2::<u8>::from_elem((4, 4), 1);
        let config = TilingConfig::new((4, 4), 1);

        let batch = build_label_batch(&[labels.clone()], &config, Some(5)).unwrap();
        assert_eq!(batch.dim(), (1, 4, 4, 5));

        assert!(build_label_batch(&[labels], &config, Some(1)).is_err());
    }

    // Tests training batches pair inputs and targets patch for patch
    // Verified by tiling labels with a different step
    #[test]
    fn test_build_training_batch() {
        let images = vec![gradient(9, 9)];
        let labels = vec![Array2::<u16>::from_shape_fn((9, 9), |(r, _)| u16::from(r >= 5))];
        let config = TilingConfig::new((5, 5), 2);

        let (inputs, targets) = build_training_batch(&images, &labels, &config, None).unwrap();

        assert_eq!(inputs.len_of(Axis(0)), targets.len_of(Axis(0)));
        assert_eq!(targets.dim(), (9, 5, 5, 2));
    }

    // Tests mismatched image and label lists are rejected
    // Verified by zipping the shorter list
    #[test]
    fn test_build_training_batch_mismatch() {
        let config = TilingConfig::new((2, 2), 1);
        let images = vec![gradient(4, 4), gradient(4, 4)];
        let labels = vec![Array2::<u8>::zeros((4, 4))];
        assert!(matches!(
            build_training_batch(&images, &labels, &config, None),
            Err(PatchError::InvalidGeometry { .. })
        ));

        let wrong_shape = vec![Array2::<u8>::zeros((4, 4)), Array2::zeros((4, 5))];
        assert!(matches!(
            build_training_batch(&images, &wrong_shape, &config, None),
            Err(PatchError::InvalidGeometry { .. })
        ));
    }
}
