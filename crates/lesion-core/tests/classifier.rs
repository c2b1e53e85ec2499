use image::{Rgb, RgbImage};
use lesion_core::prelude::*;
use lesion_core::tract_core::prelude::Tensor;
use rand::{rngs::StdRng, SeedableRng};

struct TestInferer<F: Fn(&Tensor) -> anyhow::Result<Vec<f32>> + Send + Sync> {
    forward: F,
    in_shapes: Vec<(String, Vec<usize>)>,
    out_shapes: Vec<(String, Vec<usize>)>,
}

impl<F> Inferer for TestInferer<F>
where
    F: Fn(&Tensor) -> anyhow::Result<Vec<f32>> + Send + Sync,
{
    fn infer(&self, input: Tensor) -> anyhow::Result<Vec<f32>> {
        (self.forward)(&input)
    }

    fn input_shapes(&self) -> &[(String, Vec<usize>)] {
        &self.in_shapes
    }

    fn output_shapes(&self) -> &[(String, Vec<usize>)] {
        &self.out_shapes
    }
}

fn inferer<F>(forward: F) -> TestInferer<F>
where
    F: Fn(&Tensor) -> anyhow::Result<Vec<f32>> + Send + Sync,
{
    TestInferer {
        forward,
        in_shapes: vec![("input".to_owned(), vec![1])],
        out_shapes: vec![("scores".to_owned(), vec![2])],
    }
}

/// Lesion probability as the sigmoid of the mean input value.
fn mean_sigmoid(input: &Tensor) -> anyhow::Result<Vec<f32>> {
    let data = input.as_slice::<f32>()?;
    let mean = data.iter().sum::<f32>() / data.len() as f32;
    let p = 1.0 / (1.0 + (-mean).exp());
    Ok(vec![1.0 - p, p])
}

fn checkerboard() -> RgbImage {
    RgbImage::from_fn(512, 384, |x, y| {
        if (x / 24 + y / 24) % 2 == 0 {
            Rgb([230, 180, 160])
        } else {
            Rgb([90, 40, 30])
        }
    })
}

#[test]
fn patch_vit_end_to_end() {
    let classifier = Classifier::new(
        ModelSpec::patch_vit(),
        inferer(|input| {
            assert_eq!(input.shape(), &[1, 128, 16, 2, 16, 2]);
            Ok(vec![0.2, 0.8])
        }),
    )
    .unwrap();

    let prediction = classifier
        .classify(&checkerboard(), &mut StdRng::seed_from_u64(3))
        .unwrap();

    assert_eq!(prediction.index, 1);
    assert_eq!(prediction.to_string(), "Lesion detected (prob: 80.0%)");
}

#[test]
fn patch_vit_variance_is_bounded() {
    let classifier = Classifier::new(ModelSpec::patch_vit(), inferer(mean_sigmoid)).unwrap();
    let image = checkerboard();

    let confidences: Vec<f32> = (0..10)
        .map(|_| {
            let p = classifier
                .classify(&image, &mut rand::thread_rng())
                .unwrap();
            if p.index == 1 {
                p.confidence
            } else {
                1.0 - p.confidence
            }
        })
        .collect();

    let lo = confidences.iter().cloned().fold(f32::INFINITY, f32::min);
    let hi = confidences.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    assert!(hi - lo < 0.15, "confidences spread too far: {:?}", confidences);
}

#[test]
fn softmax_model_end_to_end() {
    let labels: Vec<String> = (0..14).map(|i| format!("class {}", i)).collect();
    let classifier = Classifier::new(
        ModelSpec::resized(labels),
        inferer(|input| {
            assert_eq!(input.shape(), &[1, 3, 256, 256]);
            let mut logits = vec![0.0; 14];
            logits[9] = 3.0;
            Ok(logits)
        }),
    )
    .unwrap();

    let prediction = classifier
        .classify(&checkerboard(), &mut StdRng::seed_from_u64(0))
        .unwrap();

    assert_eq!(prediction.label, "class 9");
    // e^3 / (e^3 + 13)
    assert_eq!(prediction.to_string(), "class 9 (60.71%)");
}

#[test]
fn native_model_sees_source_size() {
    let classifier = Classifier::new(
        ModelSpec::native(vec!["benign".to_owned(), "malignant".to_owned()]),
        inferer(|input| {
            assert_eq!(input.shape(), &[1, 3, 384, 512]);
            Ok(vec![4.0, 1.0])
        }),
    )
    .unwrap();

    let prediction = classifier
        .classify(&checkerboard(), &mut StdRng::seed_from_u64(0))
        .unwrap();
    assert_eq!(prediction.label, "benign");
}

#[test]
fn inference_errors_are_verbatim() {
    let classifier = Classifier::new(
        ModelSpec::patch_vit(),
        inferer(|_| anyhow::bail!("Input at index 0 has incorrect dtype or shape")),
    )
    .unwrap();

    let err = classifier
        .classify(&checkerboard(), &mut StdRng::seed_from_u64(0))
        .unwrap_err();

    assert!(matches!(err, ClassifyError::Inference(_)));
    assert_eq!(
        err.to_string(),
        "Input at index 0 has incorrect dtype or shape"
    );
}

#[test]
fn wrong_score_count_is_reported() {
    let classifier =
        Classifier::new(ModelSpec::patch_vit(), inferer(|_| Ok(vec![0.1, 0.2, 0.7]))).unwrap();

    let err = classifier
        .classify(&checkerboard(), &mut StdRng::seed_from_u64(0))
        .unwrap_err();

    assert!(matches!(
        err,
        ClassifyError::Postprocess(PostprocessError::LabelMismatch { .. })
    ));
}

#[test]
fn invalid_spec_is_rejected() {
    let mut spec = ModelSpec::patch_vit();
    spec.labels.clear();

    let res = Classifier::new(spec, inferer(mean_sigmoid));
    assert!(matches!(res, Err(SpecError::NoLabels)));
}
