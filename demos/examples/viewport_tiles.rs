// Copyright 2025 the Mapgrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two grids over geographic coordinates: a fine bucket store and a coarse
//! view grid that follows a moving viewport.
//!
//! - The bucket store indexes every city once, in 5 km tiles.
//! - The view grid uses 100 km tiles. Each live view tile holds the cities
//!   inside it, pulled from the bucket store when the tile is materialized.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p mapgrid_demos --example viewport_tiles`

use kurbo::{Point, Vec2};
use mapgrid_tiles::{GridIndex, Region, SpatialTileGrid, TileIndex};

#[derive(Clone, Copy, Debug)]
struct City {
    name: &'static str,
    // Longitude, latitude in degrees.
    position: Point,
}

const CITIES: &[(&str, f64, f64)] = &[
    ("Helsinki", 24.94, 60.17),
    ("Espoo", 24.66, 60.21),
    ("Vantaa", 25.04, 60.29),
    ("Porvoo", 25.66, 60.39),
    ("Lahti", 25.66, 60.98),
    ("Hameenlinna", 24.46, 61.00),
    ("Tampere", 23.76, 61.50),
    ("Turku", 22.27, 60.45),
    ("Tallinn", 24.75, 59.44),
    ("Kotka", 26.95, 60.47),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut store: SpatialTileGrid<Vec<City>> =
        SpatialTileGrid::new(GridIndex::geographic(5_000.0)?);
    for &(name, lon, lat) in CITIES {
        let position = Point::new(lon, lat);
        store.push_at(position, City { name, position });
    }
    println!("bucket store: {} cities in {} buckets", CITIES.len(), store.len());

    let mut view: SpatialTileGrid<Vec<City>> =
        SpatialTileGrid::new(GridIndex::geographic(100_000.0)?);

    // Center and half span in degrees, like a map camera.
    let viewports = [
        ("helsinki", Point::new(24.94, 60.17), Vec2::new(0.6, 0.3)),
        ("pan east", Point::new(25.80, 60.30), Vec2::new(0.6, 0.3)),
        ("zoom out", Point::new(25.00, 60.50), Vec2::new(1.8, 1.0)),
        ("zoom out again", Point::new(25.00, 60.50), Vec2::new(1.8, 1.0)),
        ("tallinn", Point::new(24.75, 59.44), Vec2::new(0.4, 0.2)),
    ];

    for (label, center, half_span) in viewports {
        // Only keep the middle of the screen so cropping happens on-screen.
        let visible = Region::from_center(center, half_span)?.scaled_about_center(0.5)?;
        let update = view.update(&visible, |index, grid| cities_in(&store, grid, index));
        println!("{label}: update: +{} -{}", update.added.len(), update.removed.len());
        for tile in &update.removed {
            println!("  dropped {} ({} cities)", describe(tile.index), tile.payload.len());
        }
        for index in &update.added {
            let names: Vec<&str> = view
                .get(*index)
                .into_iter()
                .flatten()
                .map(|city| city.name)
                .collect();
            println!("  added {} {names:?}", describe(*index));
        }
    }

    Ok(())
}

/// Cities owned by the view tile at `index`.
///
/// Buckets are selected coarsely, then refined by ownership so a city on a
/// tile edge lands in exactly one view tile.
fn cities_in(
    store: &SpatialTileGrid<Vec<City>>,
    view: &SpatialTileGrid<Vec<City>>,
    index: TileIndex,
) -> Vec<City> {
    store
        .items_in(&view.region(index))
        .filter(|city| view.grid_index().owns(index, city.position))
        .copied()
        .collect()
}

fn describe(index: TileIndex) -> String {
    format!("({}, {})", index.col, index.row)
}
