// Copyright (c) 2022-2023 Rafael Villar Burke <pachi@ietcc.csic.es>
// Distributed under the MIT License
// (See acoompanying LICENSE file or a copy at http://opensource.org/licenses/MIT)

//! Ensamblado y serialización de los resultados del trazado
//!
//! La tabla de sensores enlaza cada sensor XYZ con su columna, su arista y su
//! edificio, y la serie temporal guarda la irradiancia proyectada sobre la
//! fachada por sensor y hora del año

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Error};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::trace::Scene;
use crate::types::{Orientation, XYSensor, XYZSensor};

/// Registro de resultados de un sensor XYZ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorRecord {
    /// Identificador del sensor XYZ
    pub xyz_sensor_id: usize,
    /// Sensor XY del que cuelga
    pub xy_sensor_id: usize,
    /// Arista de fachada
    pub edge_id: usize,
    /// Edificio
    pub building_id: u16,
    /// Código de arquetipo del edificio
    pub archetype_id: u8,
    /// Nombre del arquetipo
    pub archetype: String,
    /// Orientación cardinal de la fachada
    pub orientation: Orientation,
    /// Altura del sensor sobre rasante [m]
    pub height: f32,
    /// Recuento de rayos no obstruidos
    pub rad: u32,
}

/// Resultados del trazado
#[derive(Debug, Clone)]
pub struct TraceResults {
    /// Tabla de sensores con sus recuentos de rayos
    pub sensors: Vec<SensorRecord>,
    /// Irradiancia proyectada sobre fachada por sensor y hora, W/m², (n, 8760)
    pub time_series: Array2<f32>,
}

impl TraceResults {
    /// Monta la tabla de sensores enlazando sensores, aristas y edificios
    pub(crate) fn assemble(
        scene: &Scene,
        xy_sensors: &[XYSensor],
        xyz_sensors: &[XYZSensor],
        time_series: Array2<f32>,
    ) -> Self {
        let sensors = xyz_sensors
            .iter()
            .enumerate()
            .map(|(xyz_sensor_id, sensor)| {
                let xy_sensor_id = sensor.parent_xy;
                let edge_id = xy_sensors[xy_sensor_id].parent_edge;
                let edge = &scene.edges[edge_id];
                let building_id = edge.building_id;
                let archetype_id = scene.buildings[building_id as usize].archetype_id;
                SensorRecord {
                    xyz_sensor_id,
                    xy_sensor_id,
                    edge_id,
                    building_id,
                    archetype_id,
                    archetype: scene.archetypes[archetype_id as usize].clone(),
                    orientation: edge.orientation,
                    height: sensor.height,
                    rad: sensor.rad,
                }
            })
            .collect();
        Self {
            sensors,
            time_series,
        }
    }

    /// Tabla de sensores en formato JSON
    pub fn sensors_as_json(&self) -> Result<String, Error> {
        let json = serde_json::to_string_pretty(&self.sensors)?;
        Ok(json)
    }

    /// Guarda la serie temporal en formato binario (bincode)
    pub fn save_time_series<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let file = File::create(path.as_ref()).with_context(|| {
            format!(
                "No se ha podido crear el archivo de series \"{}\"",
                path.as_ref().display()
            )
        })?;
        bincode::serialize_into(BufWriter::new(file), &self.time_series)?;
        Ok(())
    }

    /// Recupera una serie temporal guardada
    pub fn load_time_series<P: AsRef<Path>>(path: P) -> Result<Array2<f32>, Error> {
        let file = File::open(path.as_ref()).with_context(|| {
            format!(
                "No se ha podido abrir el archivo de series \"{}\"",
                path.as_ref().display()
            )
        })?;
        Ok(bincode::deserialize_from(BufReader::new(file))?)
    }
}
