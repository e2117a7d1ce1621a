// Copyright (c) 2022-2023 Rafael Villar Burke <pachi@ietcc.csic.es>
// Distributed under the MIT License
// (See acoompanying LICENSE file or a copy at http://opensource.org/licenses/MIT)

//! Acumulación horaria de la irradiancia de cielo sobre los sensores
//!
//! Para cada rayo visible se localiza el parche de cielo al que apunta y se
//! suma su irradiancia normal a la serie horaria del sensor, proyectada sobre
//! el plano de la fachada con el factor de incidencia. No se divide por el
//! número de azimuts del trazador: la salida queda en irradiancia sumada sobre
//! el muestreo azimutal, un factor de escala fijo que aplica el consumidor

use ndarray::parallel::prelude::*;
use ndarray::{s, Array2, Axis};
use sky::{SkyDome, HOURS_PER_YEAR};

use crate::types::{XYSensor, XYZSensor};

use super::mask::VisibilityMask;
use super::scene::Scene;

/// Acumula la irradiancia normal de los parches visibles en las series horarias
///
/// Paraleliza por filas de la serie (una por sensor XYZ): cada fila se escribe
/// desde un único hilo y la suma por horas es determinista
pub fn accumulate_timesteps(
    scene: &Scene,
    sky: &SkyDome,
    azimuths: &[f32],
    xy_sensors: &[XYSensor],
    xyz_sensors: &[XYZSensor],
    mask: &VisibilityMask,
) -> Array2<f32> {
    let mut time_series = Array2::zeros((xyz_sensors.len(), HOURS_PER_YEAR));
    let azimuth_inc = sky.azimuthal_aperture;
    let n_sky_azimuths = sky.n_azimuths as i64;
    time_series
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(sensor_ix, mut row)| {
            let sensor = &xyz_sensors[sensor_ix];
            let edge = &scene.edges[xy_sensors[sensor.parent_xy].parent_edge];
            for (a, e) in mask.iter_visible(sensor_ix) {
                // Azimut de emisión del rayo en el marco del mundo
                let az_angle = azimuths[a] + edge.az_start_angle;
                // Parche de cielo al que apunta el rayo (el azimut puede ser negativo)
                let sky_az =
                    ((az_angle / azimuth_inc).floor() as i64).rem_euclid(n_sky_azimuths) as usize;
                // Proyección horizontal sobre la normal y vertical según la elevación
                let incidence = (az_angle - edge.normal_theta).abs().cos()
                    * sky.elevation_centers[e].cos();
                let patch = sky.normal_irradiance.slice(s![e, sky_az, ..]);
                row.scaled_add(incidence, &patch);
            }
        });
    time_series
}
