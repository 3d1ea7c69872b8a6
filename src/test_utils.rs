/*
 * Test utilities and mock helpers for Pulseboard
 *
 * This module provides common test utilities, mock objects, and helper functions
 * that can be used across different test modules.
 */

#[cfg(test)]
pub mod test_utils {
    use crate::api::{MetricDescriptor, MockMetricsApi, SegmentGroup, SegmentValue, SeriesPoint};
    use crate::catalog::Catalog;
    use crate::grid::{CardId, CardState};
    use ratatui::buffer::Buffer;

    pub fn create_mock_metrics() -> Vec<MetricDescriptor> {
        vec![
            MetricDescriptor { id: "active_users".to_string(), display_name: "Active Users".to_string() },
            MetricDescriptor { id: "revenue".to_string(), display_name: "Revenue".to_string() },
            MetricDescriptor { id: "sessions".to_string(), display_name: "Sessions".to_string() },
        ]
    }

    fn value(id: &str, name: &str) -> SegmentValue {
        SegmentValue { segment_id: id.to_string(), display_name: name.to_string() }
    }

    /// Two groups: region (us, eu, apac) and plan (free, pro).
    pub fn create_mock_segments() -> Vec<SegmentGroup> {
        vec![
            SegmentGroup {
                segment_key: "region".to_string(),
                display_name: "Region".to_string(),
                values: vec![
                    value("us", "United States"),
                    value("eu", "Europe"),
                    value("apac", "Asia Pacific"),
                ],
            },
            SegmentGroup {
                segment_key: "plan".to_string(),
                display_name: "Plan".to_string(),
                values: vec![value("free", "Free"), value("pro", "Pro")],
            },
        ]
    }

    pub fn create_mock_catalog() -> Catalog {
        Catalog::new(create_mock_metrics(), create_mock_segments())
    }

    pub fn card_id(raw: u64) -> CardId {
        CardId::from(raw)
    }

    /// A card bound to the catalog defaults.
    pub fn create_card_state(catalog: &Catalog, id: u64) -> CardState {
        let sel = catalog.default_selection().unwrap();
        CardState {
            id: card_id(id),
            metric: sel.metric,
            segment_key: sel.segment_key,
            segment_id: sel.segment_id,
            display_name: sel.display_name,
        }
    }

    pub fn series(values: &[f64]) -> Vec<SeriesPoint> {
        values.iter().map(|&value| SeriesPoint { value }).collect()
    }

    /// A mock API serving the mock catalog and `values` for every snapshot.
    pub fn mock_api_with_series(values: &[f64]) -> MockMetricsApi {
        let points = series(values);
        let mut api = MockMetricsApi::new();
        api.expect_fetch_metrics().returning(|| Ok(create_mock_metrics()));
        api.expect_fetch_segments().returning(|| Ok(create_mock_segments()));
        api.expect_fetch_snapshot().returning(move |_| Ok(points.clone()));
        api
    }

    /// Rendered rows of a test buffer as plain strings.
    pub fn buffer_lines(buf: &Buffer) -> Vec<String> {
        (buf.area.y..buf.area.y + buf.area.height)
            .map(|y| {
                (buf.area.x..buf.area.x + buf.area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::*;

    #[test]
    fn test_mock_catalog_is_ready() {
        let catalog = create_mock_catalog();
        assert!(catalog.is_ready());
        assert_eq!(catalog.metrics.len(), 3);
        assert_eq!(catalog.flattened_segments().len(), 5);
    }

    #[test]
    fn test_series_builder() {
        let s = series(&[1.0, 2.5]);
        assert_eq!(s.len(), 2);
        assert_eq!(s[1].value, 2.5);
    }
}
