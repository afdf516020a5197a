//! Tile bounds lookup.

use clap::Args;
use tilesource::coord::{to_tile_coordinate, LatLngBounds, TileCoordinate};

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct BoundsArgs {
    /// Zoom level
    #[arg(long, default_value = "12")]
    pub zoom: u8,

    /// Tile column (requires --y)
    #[arg(long, requires = "y", conflicts_with_all = ["lat", "lon"])]
    pub x: Option<u32>,

    /// Tile row (requires --x)
    #[arg(long, requires = "x")]
    pub y: Option<u32>,

    /// Latitude inside the tile (requires --lon)
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude inside the tile (requires --lat)
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Print the bounds as JSON
    #[arg(long)]
    pub json: bool,
}

/// Resolves the tile named by the arguments.
pub fn resolve_tile(args: &BoundsArgs) -> Result<TileCoordinate, CliError> {
    match (args.x, args.y, args.lat, args.lon) {
        (Some(x), Some(y), _, _) => Ok(TileCoordinate::checked(args.zoom, x, y)?),
        (_, _, Some(lat), Some(lon)) => Ok(to_tile_coordinate(lat, lon, args.zoom)?),
        _ => Err(CliError::Config(
            "Specify a tile with --x/--y or a location with --lat/--lon".to_string(),
        )),
    }
}

pub fn run(args: BoundsArgs) -> Result<(), CliError> {
    let tile = resolve_tile(&args)?;
    let bounds = LatLngBounds::from_tile(&tile);

    if args.json {
        let text = serde_json::to_string_pretty(&serde_json::json!({
            "tile": tile,
            "bounds": bounds,
        }))
        .map_err(|e| CliError::Config(e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    let (lat, lon) = bounds.center();
    println!("Tile:   {}", tile);
    println!("North:  {:.6}", bounds.north);
    println!("South:  {:.6}", bounds.south);
    println!("East:   {:.6}", bounds.east);
    println!("West:   {:.6}", bounds.west);
    println!("Center: {:.6}, {:.6}", lat, lon);
    Ok(())
}
