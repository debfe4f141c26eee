//! Lineage hashes used to detect mis-routed data.
//!
//! A location id is derived from the location's classification and the
//! extraction window, so the same source read over the same window always
//! yields the same id. The pipeline id is derived only from the three
//! location ids, which makes it functionally dependent on them.

use uuid::Uuid;

use super::{ExtractionWindow, LineageIds, Location, Topology};

pub const LINEAGE_NAMESPACE: Uuid = uuid::uuid!("6f0b3c8e-52d4-4c4b-9a57-2f1d8e0c7a31");

fn push_field(buf: &mut Vec<u8>, field: &[u8]) {
    // length prefix keeps ("ab", "c") and ("a", "bc") apart
    buf.extend_from_slice(&(field.len() as u64).to_le_bytes());
    buf.extend_from_slice(field);
}

pub fn location_id(location: &Location, window: &ExtractionWindow) -> Uuid {
    let mut buf = Vec::with_capacity(128);

    push_field(&mut buf, location.name.as_bytes());
    push_field(&mut buf, location.category.as_bytes());
    push_field(&mut buf, location.sub_type.as_bytes());
    push_field(&mut buf, window.start.to_rfc3339().as_bytes());
    push_field(&mut buf, window.end.to_rfc3339().as_bytes());

    Uuid::new_v5(&LINEAGE_NAMESPACE, &buf)
}

pub fn pipeline_id(source_id: &Uuid, stage_id: &Uuid, target_id: &Uuid) -> Uuid {
    let mut buf = [0u8; 48];
    buf[..16].copy_from_slice(source_id.as_bytes());
    buf[16..32].copy_from_slice(stage_id.as_bytes());
    buf[32..].copy_from_slice(target_id.as_bytes());

    Uuid::new_v5(&LINEAGE_NAMESPACE, &buf)
}

pub fn compute_lineage(topology: &Topology, window: &ExtractionWindow) -> LineageIds {
    let source_id = location_id(&topology.source, window);
    let stage_id = location_id(&topology.stage, window);
    let target_id = location_id(&topology.target, window);

    LineageIds {
        source_id,
        stage_id,
        target_id,
        pipeline_id: pipeline_id(&source_id, &stage_id, &target_id),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use rand::Rng;

    use super::*;

    fn window() -> ExtractionWindow {
        ExtractionWindow {
            target_day: NaiveDate::from_ymd_opt(2025, 7, 24).unwrap(),
            start: Utc.with_ymd_and_hms(2025, 7, 24, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 7, 24, 0, 15, 0).unwrap(),
        }
    }

    fn loc(name: &str, category: &str, sub_type: &str) -> Location {
        Location {
            name: name.into(),
            category: category.into(),
            sub_type: sub_type.into(),
        }
    }

    #[test]
    fn test_location_id_is_deterministic() {
        let w = window();
        let a = location_id(&loc("orders", "db", "postgres"), &w);
        let b = location_id(&loc("orders", "db", "postgres"), &w);
        assert_eq!(a, b);
    }

    #[test]
    fn test_location_id_depends_on_window_and_fields() {
        let w = window();
        let base = location_id(&loc("orders", "db", "postgres"), &w);

        let mut shifted = w.clone();
        shifted.end = Utc.with_ymd_and_hms(2025, 7, 24, 0, 30, 0).unwrap();
        assert_ne!(base, location_id(&loc("orders", "db", "postgres"), &shifted));

        assert_ne!(base, location_id(&loc("orders", "db", "mysql"), &w));
        assert_ne!(
            location_id(&loc("ab", "c", "x"), &w),
            location_id(&loc("a", "bc", "x"), &w)
        );
    }

    #[test]
    fn test_pipeline_id_equal_iff_triples_equal() {
        let mut rng = rand::rng();
        // small pool so that random triples collide often
        let pool: Vec<Uuid> = (0..3)
            .map(|_| Uuid::from_bytes(rng.random::<[u8; 16]>()))
            .collect();

        let pick = |rng: &mut rand::rngs::ThreadRng| {
            (
                pool[rng.random_range(0..pool.len())],
                pool[rng.random_range(0..pool.len())],
                pool[rng.random_range(0..pool.len())],
            )
        };

        for _ in 0..500 {
            let a = pick(&mut rng);
            let b = pick(&mut rng);

            let id_a = pipeline_id(&a.0, &a.1, &a.2);
            let id_b = pipeline_id(&b.0, &b.1, &b.2);

            assert_eq!(a == b, id_a == id_b, "triples {a:?} / {b:?}");
        }
    }

    #[test]
    fn test_compute_lineage_ties_pipeline_to_locations() {
        let topology = Topology {
            source: loc("orders", "db", "postgres"),
            stage: loc("landing", "object_store", "s3"),
            target: loc("warehouse", "dwh", "snowflake"),
        };
        let ids = compute_lineage(&topology, &window());

        assert_eq!(
            ids.pipeline_id,
            pipeline_id(&ids.source_id, &ids.stage_id, &ids.target_id)
        );
        assert_ne!(ids.source_id, ids.stage_id);
    }
}
