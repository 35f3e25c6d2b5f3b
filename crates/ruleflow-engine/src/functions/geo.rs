//! 地理函数：geohash 编解码与大圆距离（千米）

use crate::config::MAX_GEOHASH_PRECISION;
use crate::error::{Result, RuleError};

const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// 地球平均半径（千米）
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// 将经纬度编码为 geohash
pub fn geohash_encode(lat: f64, lon: f64, precision: usize) -> Result<String> {
    if !(1..=MAX_GEOHASH_PRECISION).contains(&precision) {
        return Err(RuleError::InvalidArgument(format!(
            "geohash precision must be between 1 and {}, got {}",
            MAX_GEOHASH_PRECISION, precision
        )));
    }
    check_coordinates(lat, lon)?;

    let (mut lat_range, mut lon_range) = ((-90.0_f64, 90.0_f64), (-180.0_f64, 180.0_f64));
    let mut hash = String::with_capacity(precision);
    let mut even_bit = true;
    let mut bit = 0;
    let mut index = 0usize;

    while hash.len() < precision {
        let (range, value) = if even_bit {
            (&mut lon_range, lon)
        } else {
            (&mut lat_range, lat)
        };
        let mid = (range.0 + range.1) / 2.0;
        if value >= mid {
            index = index * 2 + 1;
            range.0 = mid;
        } else {
            index *= 2;
            range.1 = mid;
        }
        even_bit = !even_bit;

        bit += 1;
        if bit == 5 {
            hash.push(BASE32[index] as char);
            bit = 0;
            index = 0;
        }
    }

    Ok(hash)
}

/// 解码 geohash，返回单元格中心 `(lat, lon)`
pub fn geohash_decode(hash: &str) -> Result<(f64, f64)> {
    if hash.is_empty() {
        return Err(RuleError::InvalidArgument("empty geohash".to_string()));
    }

    let (mut lat_range, mut lon_range) = ((-90.0_f64, 90.0_f64), (-180.0_f64, 180.0_f64));
    let mut even_bit = true;

    for ch in hash.to_lowercase().bytes() {
        let index = BASE32
            .iter()
            .position(|&c| c == ch)
            .ok_or_else(|| RuleError::InvalidArgument(format!("invalid geohash '{}'", hash)))?;

        for shift in (0..5).rev() {
            let bit_set = (index >> shift) & 1 == 1;
            let range = if even_bit {
                &mut lon_range
            } else {
                &mut lat_range
            };
            let mid = (range.0 + range.1) / 2.0;
            if bit_set {
                range.0 = mid;
            } else {
                range.1 = mid;
            }
            even_bit = !even_bit;
        }
    }

    Ok((
        (lat_range.0 + lat_range.1) / 2.0,
        (lon_range.0 + lon_range.1) / 2.0,
    ))
}

/// haversine 大圆距离（千米）
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// 两个 geohash 单元格中心之间的距离（千米）
pub fn geohash_distance(hash1: &str, hash2: &str) -> Result<f64> {
    let (lat1, lon1) = geohash_decode(hash1)?;
    let (lat2, lon2) = geohash_decode(hash2)?;
    Ok(distance(lat1, lon1, lat2, lon2))
}

pub fn within_radius(lat1: f64, lon1: f64, lat2: f64, lon2: f64, radius_km: f64) -> bool {
    distance(lat1, lon1, lat2, lon2) <= radius_km
}

fn check_coordinates(lat: f64, lon: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(RuleError::InvalidArgument(format!(
            "coordinates out of range: ({}, {})",
            lat, lon
        )));
    }
    Ok(())
}
