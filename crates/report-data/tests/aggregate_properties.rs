//! Aggregation results must not depend on the order fetches complete in

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use image::{DynamicImage, ImageFormat, RgbImage};
use proptest::prelude::*;
use report_data::{Aggregator, InMemoryDataService, ServiceConfig};
use shared_types::{
    Comment, Detection, ImageSlot, Inspection, InspectionStatus, RasterImage, ReportData,
    TransformerMetadata,
};

const INSPECTIONS: usize = 4;

fn png(width: u32, height: u32) -> RasterImage {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    RasterImage::new(buffer)
}

fn service(delays_ms: &[u64]) -> InMemoryDataService {
    let mut service =
        InMemoryDataService::new().with_transformer(TransformerMetadata::new("T1"));

    for (i, delay) in delays_ms.iter().enumerate() {
        let number = format!("INS-{i}");
        let created_at = chrono::NaiveDate::from_ymd_opt(2025, 1, 1 + i as u32)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        service = service
            .with_inspection(Inspection::new(&number, "T1", InspectionStatus::Completed))
            .with_detections(
                &number,
                vec![Detection::new(&number, "pf", 0.5, (20.0, 20.0), (10.0, 10.0))],
            )
            .with_comments(
                &number,
                vec![Comment {
                    id: Some(i as i64),
                    inspection_number: number.clone(),
                    topic: format!("topic {i}"),
                    body: "body".into(),
                    author: "tech".into(),
                    created_at: Some(created_at),
                }],
            )
            .with_delay(&number, Duration::from_millis(*delay));
        // Every other inspection has an image
        if i % 2 == 0 {
            service = service.with_image(&number, png(48, 32));
        }
    }
    service
}

fn aggregate(delays_ms: &[u64]) -> ReportData {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap();
    runtime.block_on(async {
        Aggregator::new(Arc::new(service(delays_ms)), &ServiceConfig::default())
            .aggregate("T1")
            .await
            .unwrap()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn completion_order_does_not_change_the_snapshot(
        delays in Just(vec![0u64, 150, 300, 450]).prop_shuffle()
    ) {
        let baseline = aggregate(&[0; INSPECTIONS]);
        let shuffled = aggregate(&delays);

        prop_assert_eq!(&shuffled, &baseline);

        let numbers: Vec<_> = shuffled
            .inspections
            .iter()
            .map(|i| i.inspection_number.as_str())
            .collect();
        prop_assert_eq!(numbers, vec!["INS-0", "INS-1", "INS-2", "INS-3"]);
        prop_assert!(matches!(shuffled.image_for("INS-0"), Some(ImageSlot::Annotated(_))));
        prop_assert!(shuffled.image_for("INS-1").is_none());
    }

    #[test]
    fn images_slower_than_the_timeout_become_unavailable(
        delays in prop::collection::vec(prop_oneof![0u64..900, 1_100u64..2_000], INSPECTIONS)
    ) {
        let data = aggregate(&delays);

        for (i, delay) in delays.iter().enumerate() {
            let number = format!("INS-{i}");
            prop_assert_eq!(data.detections_for(&number).len(), 1);
            prop_assert_eq!(data.comments_for(&number).len(), 1);

            let slot = data.image_for(&number);
            if *delay >= 1_000 {
                prop_assert_eq!(slot, Some(&ImageSlot::Unavailable));
            } else if i % 2 == 0 {
                prop_assert!(matches!(slot, Some(ImageSlot::Annotated(_))));
            } else {
                prop_assert!(slot.is_none());
            }
        }
    }
}
