// Copyright (c) 2022-2023 Rafael Villar Burke <pachi@ietcc.csic.es>
// Distributed under the MIT License
// (See acoompanying LICENSE file or a copy at http://opensource.org/licenses/MIT)

//! Posicionamiento de los sensores de fachada
//!
//! Los sensores XY se reparten a lo largo de cada arista con un retranqueo en
//! los extremos y separados de la fachada según la normal exterior. Cada uno
//! sostiene una columna de sensores XYZ, uno por planta del edificio

use crate::config::TraceConfig;
use crate::types::{XYSensor, XYZSensor};

use super::scene::Scene;

/// Genera los sensores XY de cada arista y sus columnas de sensores XYZ
pub fn layout_sensors(scene: &Scene, config: &TraceConfig) -> (Vec<XYSensor>, Vec<XYZSensor>) {
    let mut xy_sensors = Vec::with_capacity(scene.n_xy_sensors);
    for (edge_ix, edge) in scene.edges.iter().enumerate() {
        for k in 0..edge.sensor_count() {
            let loc = edge.start
                + (config.sensor_inset + k as f32 * config.sensor_spacing) * edge.slopevec
                + config.sensor_normal_offset * edge.normal;
            xy_sensors.push(XYSensor {
                loc,
                parent_edge: edge_ix,
                xyz_start: 0,
                xyz_count: edge.n_floors,
            });
        }
    }

    // Columnas XYZ con sumas prefijas para los rangos
    let mut xyz_sensors = Vec::new();
    for xy_ix in 0..xy_sensors.len() {
        let xy = &mut xy_sensors[xy_ix];
        xy.xyz_start = xyz_sensors.len();
        for floor_ix in 0..xy.xyz_count {
            // Sensores a media altura de cada banda vertical
            let height = f32::from(floor_ix) * config.sensor_floor_factor * config.f2f_height;
            xyz_sensors.push(XYZSensor {
                height,
                parent_xy: xy_ix,
                rad: 0,
            });
        }
    }
    (xy_sensors, xyz_sensors)
}
