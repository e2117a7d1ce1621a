// Copyright (c) 2022-2023 Rafael Villar Burke <pachi@ietcc.csic.es>
// Distributed under the MIT License
// (See acoompanying LICENSE file or a copy at http://opensource.org/licenses/MIT)

//! Trazado de rayos sobre la malla de alturas
//!
//! Cada rayo (sensor XYZ, azimut, elevación) avanza por el plano del terreno en
//! pasos fijos. En cada celda activa se compara el ángulo hasta la coronación
//! del obstáculo con la elevación del rayo: si el obstáculo sobresale, el rayo
//! queda obstruido; si el rayo sale del dominio o agota su longitud, alcanza el
//! cielo. La elevación no cambia el recorrido en planta
//!
//! El trazado unificado recorre la malla una vez por rayo. La variante en dos
//! fases registra primero los cruces de cada rayo XY y después filtra por
//! elevación; produce los mismos resultados y conserva los cruces para
//! depuración y visualización de primeros impactos

use rayon::prelude::*;

use crate::config::TraceConfig;
use crate::types::{point, vector, Point2, Vector2, XYSensor, XYZSensor};

use super::grid::HeightGrid;
use super::mask::VisibilityMask;
use super::scene::Scene;

/// Cruce de un rayo XY con una celda activa de la malla
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Hit {
    /// Columna de la celda cruzada
    pub i: i16,
    /// Fila de la celda cruzada
    pub j: i16,
    /// Altura de la celda [m]
    pub height: f32,
    /// Distancia recorrida por el rayo hasta el cruce [m]
    pub distance: f32,
}

impl Hit {
    /// Centro de la celda cruzada [m]
    pub fn centroid(&self) -> Point2 {
        point![f32::from(self.i) + 0.5, f32::from(self.j) + 0.5]
    }
}

/// Traza todos los rayos (sensor XYZ, azimut, elevación) en una sola pasada
///
/// Paraleliza por sensores: cada hilo escribe solo la porción de máscara y el
/// recuento de su sensor, de modo que no hay escrituras compartidas
pub fn trace_unified(
    scene: &Scene,
    grid: &HeightGrid,
    config: &TraceConfig,
    azimuths: &[f32],
    elevations: &[f32],
    xy_sensors: &[XYSensor],
    xyz_sensors: &mut [XYZSensor],
    mask: &mut VisibilityMask,
) {
    let words_per_sensor = mask.words_per_sensor();
    let n_elevations = elevations.len();
    xyz_sensors
        .par_iter_mut()
        .zip(mask.words_mut().par_chunks_mut(words_per_sensor))
        .for_each(|(sensor, words)| {
            let xy = &xy_sensors[sensor.parent_xy];
            let edge = &scene.edges[xy.parent_edge];
            for (a, az_offset) in azimuths.iter().enumerate() {
                let az_angle = az_offset + edge.az_start_angle;
                let dir = vector![az_angle.cos(), az_angle.sin()];
                for (e, &el_angle) in elevations.iter().enumerate() {
                    let blocked =
                        cast_ray(grid, config, scene, xy.loc, dir, el_angle, sensor.height);
                    if blocked.is_none() {
                        VisibilityMask::set_in_sensor_words(words, n_elevations, a, e);
                        sensor.rad += 1;
                    }
                }
            }
        });
}

/// Recorre un rayo en pasos fijos y devuelve la distancia del primer obstáculo
///
/// Devuelve None si el rayo sale del dominio o agota su longitud sin toparse
/// con un obstáculo. Un cruce con ángulo de obstáculo exactamente igual a la
/// elevación no obstruye (comparación estricta), y la última celda interior a
/// distancia max_ray_length todavía se muestrea
pub fn cast_ray(
    grid: &HeightGrid,
    config: &TraceConfig,
    scene: &Scene,
    start: Point2,
    dir: Vector2,
    el_angle: f32,
    sensor_height: f32,
) -> Option<f32> {
    let mut step = 0u32;
    loop {
        let distance = step as f32 * config.ray_step_size;
        let next = start + distance * dir;
        if next.x <= 0.0
            || next.y <= 0.0
            || next.x >= scene.width
            || next.y >= scene.length
            || distance > config.max_ray_length
        {
            return None;
        }
        if let Some(cell_height) = grid.height_at(next.x.floor() as i64, next.y.floor() as i64) {
            let height_diff = cell_height - sensor_height;
            let theta = height_diff.atan2(distance);
            if theta > el_angle {
                return Some(distance);
            }
        }
        step += 1;
    }
}

/// Primera fase del trazado en dos pasadas: cruces de cada rayo (sensor XY, azimut)
///
/// Devuelve, por cada rayo XY, la lista de celdas activas cruzadas en orden de
/// distancia creciente, indexada por sensor_xy * n_azimuths + azimut
pub fn trace_xy_hits(
    scene: &Scene,
    grid: &HeightGrid,
    config: &TraceConfig,
    azimuths: &[f32],
    xy_sensors: &[XYSensor],
) -> Vec<Vec<Hit>> {
    let n_azimuths = azimuths.len();
    (0..xy_sensors.len() * n_azimuths)
        .into_par_iter()
        .map(|ray_ix| {
            let xy = &xy_sensors[ray_ix / n_azimuths];
            let edge = &scene.edges[xy.parent_edge];
            let az_angle = azimuths[ray_ix % n_azimuths] + edge.az_start_angle;
            let dir = vector![az_angle.cos(), az_angle.sin()];
            let mut hits = Vec::new();
            let mut step = 0u32;
            loop {
                let distance = step as f32 * config.ray_step_size;
                let next = xy.loc + distance * dir;
                if next.x <= 0.0
                    || next.y <= 0.0
                    || next.x >= scene.width
                    || next.y >= scene.length
                    || distance > config.max_ray_length
                {
                    break;
                }
                let (i, j) = (next.x.floor() as i64, next.y.floor() as i64);
                if let Some(height) = grid.height_at(i, j) {
                    hits.push(Hit {
                        i: i as i16,
                        j: j as i16,
                        height,
                        distance,
                    });
                }
                step += 1;
            }
            hits
        })
        .collect()
}

/// Segunda fase del trazado en dos pasadas: filtrado de los cruces por elevación
///
/// Equivalente al trazado unificado sobre las mismas listas de cruces
pub fn trace_two_phase(
    azimuths: &[f32],
    elevations: &[f32],
    xyz_sensors: &mut [XYZSensor],
    hits: &[Vec<Hit>],
    mask: &mut VisibilityMask,
) {
    let words_per_sensor = mask.words_per_sensor();
    let n_azimuths = azimuths.len();
    let n_elevations = elevations.len();
    xyz_sensors
        .par_iter_mut()
        .zip(mask.words_mut().par_chunks_mut(words_per_sensor))
        .for_each(|(sensor, words)| {
            for a in 0..n_azimuths {
                let ray_hits = &hits[sensor.parent_xy * n_azimuths + a];
                for (e, &el_angle) in elevations.iter().enumerate() {
                    let blocked = ray_hits.iter().any(|hit| {
                        (hit.height - sensor.height).atan2(hit.distance) > el_angle
                    });
                    if !blocked {
                        VisibilityMask::set_in_sensor_words(words, n_elevations, a, e);
                        sensor.rad += 1;
                    }
                }
            }
        });
}
