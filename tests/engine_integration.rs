use ripesense::detection::{BoundingBox, Detection, RawDetection, prepare_detections};
use ripesense::labels::{ClassTable, parse_class_name};
use ripesense::spectral::{MockScanner, ReplayScanner};
use ripesense::{
    Agreement, FusionEngine, FusionMethod, QualityStatus, Ripeness, ScanSummary, SpectralAnalysis,
};

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

fn detection(x: f32, class_name: &str, confidence: f32) -> Detection {
    Detection::new(
        BoundingBox::new(x, 10.0, x + 50.0, 60.0),
        0,
        class_name,
        confidence,
    )
}

fn reading(category: Ripeness, quality_score: f32, confidence: f32) -> SpectralAnalysis {
    SpectralAnalysis {
        ripeness_score: 0.7,
        ripeness_category: category,
        quality_score,
        confidence,
    }
}

#[test]
fn matching_ripeness_gets_high_agreement() {
    let engine = FusionEngine::new();
    let result = engine.fuse_single(
        &detection(0.0, "Banana Ripe", 0.9),
        &reading(Ripeness::Ripe, 0.7, 0.8),
    );
    assert_eq!(result.agreement, Some(Agreement::High));
    assert_eq!(result.ripeness, Ripeness::Ripe);
    assert!(approx(result.ripeness_confidence, 0.95));
}

#[test]
fn distant_stages_fall_back_to_confidence_margin() {
    let engine = FusionEngine::new();
    let result = engine.fuse_single(
        &detection(0.0, "Mango Unripe", 0.9),
        &reading(Ripeness::Overripe, 0.3, 0.5),
    );
    assert_eq!(result.agreement, Some(Agreement::Moderate));
    assert_eq!(result.ripeness, Ripeness::Unripe);
    assert!(approx(result.ripeness_confidence, 0.7));
}

#[test]
fn quality_disagreement_is_blended() {
    let engine = FusionEngine::new();
    let result = engine.fuse_single(
        &detection(0.0, "Cashew Ripe", 0.8),
        &reading(Ripeness::Ripe, 0.85, 0.8),
    );
    // spectral alone says fresh; 0.85*0.4 + 0.6*0.6 = 0.70
    assert_eq!(result.quality_status, QualityStatus::Ripe);
}

#[test]
fn labels_parse_into_fruit_and_stage() {
    let banana = parse_class_name("Banana Unripe");
    assert_eq!(banana.fruit_type, "Banana");
    assert_eq!(banana.ripeness, Ripeness::Unripe);
    assert_eq!(banana.quality_status, QualityStatus::Unripe);

    let cacao = parse_class_name("Cacao");
    assert_eq!(cacao.fruit_type, "Cacao");
}

#[test]
fn one_failed_reading_leaves_the_batch_intact() {
    let engine = FusionEngine::new();
    let detections = [
        detection(0.0, "Banana Ripe", 0.9),
        detection(100.0, "Mango Overripe", 0.6),
        detection(200.0, "Pineapple Unripe", 0.7),
    ];
    let mut scanner = ReplayScanner::new(vec![
        Some(reading(Ripeness::Ripe, 0.9, 0.8)),
        None,
        Some(reading(Ripeness::Unripe, 0.45, 0.9)),
    ]);

    let results = engine.fuse_detections(&detections, &mut scanner);
    assert_eq!(results.len(), 3);

    for (result, detection) in results.iter().zip(&detections) {
        assert_eq!(result.class_name, detection.class_name);
        assert_eq!(result.bbox, detection.bbox);
        assert_eq!(result.fusion_method, FusionMethod::WeightedAverage);
    }

    assert_eq!(results[0].nir_ripeness, Some(Ripeness::Ripe));
    assert_eq!(results[0].agreement, Some(Agreement::High));

    assert_eq!(results[1].nir_ripeness, Some(Ripeness::Unknown));
    assert_eq!(results[1].nir_confidence, Some(0.5));

    assert_eq!(results[2].nir_ripeness, Some(Ripeness::Unripe));
    assert_eq!(results[2].quality_status, QualityStatus::Unripe);
    assert_eq!(results[2].agreement, Some(Agreement::High));
}

#[test]
fn mock_scanner_feeds_a_full_pipeline() {
    let raw: Vec<RawDetection> = serde_json::from_str(
        r#"[
            {"bbox": [0, 0, 40, 40], "class_id": 0, "confidence": 0.8},
            {"bbox": [50, 0, 90, 40], "class_id": 1, "confidence": 0.85},
            {"bbox": [0, 50, 40, 90], "class_id": 99, "confidence": 0.4}
        ]"#,
    )
    .unwrap();
    let detections = prepare_detections(raw, &ClassTable::builtin());
    assert_eq!(detections[2].class_name, "Class_99");

    let engine = FusionEngine::new();
    let mut scanner = MockScanner::seeded(7);
    let results = engine.fuse_detections(&detections, &mut scanner);

    assert_eq!(results.len(), 3);
    for result in &results {
        assert!((0.0..=1.0).contains(&result.confidence));
        assert!((0.0..=1.0).contains(&result.ripeness_confidence));
        let nir = result.nir_confidence.unwrap();
        assert!((0.7..0.95).contains(&nir));
    }

    let summary = ScanSummary::from_results(&results);
    assert_eq!(summary.total_fruits, 3);
    assert_eq!(summary.fruit_counts.get("Banana"), Some(&2));
    assert_eq!(summary.quality_counts.values().sum::<usize>(), 3);
}

#[test]
fn weights_can_change_while_fusing() {
    let engine = FusionEngine::new();
    let detections: Vec<Detection> = (0..200)
        .map(|i| detection(i as f32, "Banana Ripe", 0.9))
        .collect();

    std::thread::scope(|scope| {
        let fusing = scope.spawn(|| {
            let mut scanner = ReplayScanner::new(
                (0..detections.len()).map(|_| Some(reading(Ripeness::Ripe, 0.7, 0.5))),
            );
            engine.fuse_detections(&detections, &mut scanner)
        });
        scope.spawn(|| {
            for _ in 0..50 {
                engine.set_fusion_weights(1.0, 0.0).unwrap();
                engine.set_fusion_weights(0.0, 1.0).unwrap();
            }
        });

        let results = fusing.join().unwrap();
        assert_eq!(results.len(), detections.len());
        // every result used one consistent pair, so it lies on [0.5, 0.9]
        for result in results {
            assert!(result.confidence >= 0.5 - 1e-5 && result.confidence <= 0.9 + 1e-5);
        }
    });
}
