// Copyright 2025 the Mapgrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Driving a fading annotation layer from tile-grid snapshots.
//!
//! The visible tiles of a view grid are flattened into a snapshot of
//! annotations. A [`ReconciliationDriver`] diffs consecutive snapshots by
//! position and tells a sink what to fade out and what to add. The sink
//! materializes its views lazily, sometimes a frame late and out of order,
//! and reports them back so the driver can fade them in.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p mapgrid_demos --example fading_annotations`

use std::collections::VecDeque;
use std::time::Duration;

use kurbo::{Point, Vec2};
use mapgrid_reconcile::{
    DeltaSink, DriverConfig, Fade, PositionKey, ReconciliationDriver, Transition,
};
use mapgrid_tiles::{GridIndex, Region, SpatialTileGrid};

#[derive(Clone, Debug)]
struct Annotation {
    title: String,
    position: Point,
}

/// A pretend map view: additions are queued and only become views on the
/// next frame, in reverse order.
#[derive(Default)]
struct MapView {
    on_screen: Vec<Annotation>,
    queued: VecDeque<Annotation>,
}

impl MapView {
    fn next_frame(&mut self) -> Vec<Annotation> {
        let mut ready: Vec<Annotation> = self.queued.drain(..).collect();
        ready.reverse();
        self.on_screen.extend(ready.iter().cloned());
        ready
    }
}

impl DeltaSink<Annotation> for MapView {
    fn remove_items(&mut self, items: &[Annotation], fade_out: Option<Fade>) {
        let how = fade_out.map_or_else(
            || "now".to_owned(),
            |f| format!("after {:?}", f.duration),
        );
        for item in items {
            println!("  remove {} ({how})", item.title);
        }
        let gone: Vec<PositionKey> = items.iter().map(|a| a.position.into()).collect();
        self.on_screen
            .retain(|a| !gone.contains(&PositionKey::from(a.position)));
    }

    fn add_items(&mut self, items: &[Annotation]) {
        for item in items {
            println!("  add {}", item.title);
        }
        self.queued.extend(items.iter().cloned());
    }

    fn fade_in(&mut self, items: &[Annotation], fade: Fade) {
        let titles: Vec<&str> = items.iter().map(|a| a.title.as_str()).collect();
        println!("  fade in over {:?}: {titles:?}", fade.duration);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // One annotation per tile, placed at the tile center.
    let mut view: SpatialTileGrid<Annotation> = SpatialTileGrid::new(GridIndex::new(100.0)?);
    let config = DriverConfig::default()
        .with_transition(Transition::Fade(Fade::new(Duration::from_millis(250))))
        .with_pending_batch_limit(4);
    let mut driver =
        ReconciliationDriver::with_config(|a: &Annotation| PositionKey::from(a.position), config);
    let mut map = MapView::default();

    let centers = [
        Point::new(150.0, 150.0),
        Point::new(250.0, 150.0),
        Point::new(250.0, 150.0),
        Point::new(450.0, 350.0),
    ];
    for (frame, center) in centers.into_iter().enumerate() {
        let visible = Region::from_center(center, Vec2::new(120.0, 80.0))?;
        view.update(&visible, |index, grid| Annotation {
            title: format!("tile {},{}", index.col, index.row),
            position: grid.region(index).center(),
        });

        let mut snapshot: Vec<Annotation> =
            view.iter().map(|tile| tile.payload.clone()).collect();
        // Grid iteration order is unspecified; the driver does not care, but
        // the printout reads better sorted.
        snapshot.sort_by(|a, b| a.title.cmp(&b.title));

        println!("frame {frame}: {} annotations visible", snapshot.len());
        let batch = driver.apply(snapshot, &mut map);
        println!("  batch {} pending {}", batch.get(), driver.pending_len());

        // Views created during this frame are reported once the next one starts.
        let ready = map.next_frame();
        driver.materialized(&ready, &mut map);
    }

    println!("{} annotations on screen", map.on_screen.len());
    Ok(())
}
