// Copyright (c) 2022-2023 Rafael Villar Burke <pachi@ietcc.csic.es>
// Distributed under the MIT License
// (See acoompanying LICENSE file or a copy at http://opensource.org/licenses/MIT)

//! Opciones de configuración del trazador

use anyhow::{bail, Error};
use serde::{Deserialize, Serialize};
use sky::SkyDome;

/// Opciones del trazador de rayos
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Ancho de celda de discretización del plano del terreno [m]
    ///
    /// Actualmente debe valer 1.0
    pub node_width: f32,
    /// Retranqueo del primer y último sensor desde los extremos de la arista [m]
    pub sensor_inset: f32,
    /// Separación del sensor respecto a la fachada según la normal exterior [m]
    ///
    /// Debe superar el ancho de celda para que el sensor no quede dentro del
    /// engrosado de su propio muro
    pub sensor_normal_offset: f32,
    /// Separación entre sensores contiguos de una arista [m]
    pub sensor_spacing: f32,
    /// Altura entre plantas [m]
    pub f2f_height: f32,
    /// Factor del paso vertical entre sensores de una columna [-]
    ///
    /// Con 1.5 los sensores quedan a media altura de bandas verticales mayores
    /// que la distancia entre plantas. Parametrizado a la espera de revisión
    pub sensor_floor_factor: f32,
    /// Longitud máxima de cada rayo [m]
    pub max_ray_length: f32,
    /// Avance de cada paso del rayo [m]
    ///
    /// Debe dividir a max_ray_length
    pub ray_step_size: f32,
    /// Azimuts trazados por sensor
    ///
    /// Debe ser la mitad del número de azimuts del cielo
    pub n_azimuths: usize,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            node_width: 1.0,
            sensor_inset: 0.5,
            sensor_normal_offset: 1.5,
            sensor_spacing: 1.0,
            f2f_height: 3.0,
            sensor_floor_factor: 1.5,
            max_ray_length: 400.0,
            ray_step_size: 1.0,
            n_azimuths: 12,
        }
    }
}

impl TraceConfig {
    /// Comprueba la validez de las opciones frente al cielo elegido
    pub fn validate(&self, sky: &SkyDome) -> Result<(), Error> {
        if (self.node_width - 1.0).abs() > f32::EPSILON {
            bail!(
                "Actualmente solo se admite la discretización en celdas de 1 m (node_width = {})",
                self.node_width
            );
        }
        for (name, value) in [
            ("sensor_spacing", self.sensor_spacing),
            ("f2f_height", self.f2f_height),
            ("sensor_floor_factor", self.sensor_floor_factor),
            ("max_ray_length", self.max_ray_length),
            ("ray_step_size", self.ray_step_size),
        ] {
            if !value.is_finite() || value <= 0.0 {
                bail!("Opción {} inválida: {}", name, value);
            }
        }
        let steps = self.max_ray_length / self.ray_step_size;
        if (steps - steps.round()).abs() > 1e-6 {
            bail!(
                "El paso de rayo ({} m) debe dividir a la longitud máxima ({} m)",
                self.ray_step_size,
                self.max_ray_length
            );
        }
        if sky.n_azimuths % 2 != 0 {
            bail!(
                "El número de azimuts del cielo debe ser par: {}",
                sky.n_azimuths
            );
        }
        if self.n_azimuths * 2 != sky.n_azimuths {
            bail!(
                "Los azimuts del trazador ({}) deben ser la mitad de los del cielo ({})",
                self.n_azimuths,
                sky.n_azimuths
            );
        }
        Ok(())
    }

    /// Número de pasos de cada rayo
    pub fn n_ray_steps(&self) -> usize {
        (self.max_ray_length / self.ray_step_size).round() as usize
    }

    /// Número de plantas de un edificio según su altura
    pub fn n_floors(&self, height: f32) -> u16 {
        (height / self.f2f_height).ceil() as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use sky::{n_sky_patches, PatchMatrix, HOURS_PER_YEAR};

    fn test_sky(n_azimuths: usize) -> SkyDome {
        let rows = n_sky_patches(1) + 2;
        let mtx =
            PatchMatrix::new(1, Array2::from_elem((rows, HOURS_PER_YEAR), 1.0)).unwrap();
        SkyDome::from_patch_matrix(&mtx, n_azimuths).unwrap()
    }

    /// Validación de las opciones frente al cielo
    #[test]
    fn config_validation() {
        let sky = test_sky(24);
        let mut cfg = TraceConfig::default();
        assert!(cfg.validate(&sky).is_ok());
        assert_eq!(cfg.n_ray_steps(), 400);
        assert_eq!(cfg.n_floors(10.0), 4);
        assert_eq!(cfg.n_floors(3.0), 1);

        cfg.node_width = 0.5;
        assert!(cfg.validate(&sky).is_err());
        cfg = TraceConfig::default();

        cfg.ray_step_size = 3.0;
        assert!(cfg.validate(&sky).is_err());
        cfg = TraceConfig::default();

        cfg.n_azimuths = 10;
        assert!(cfg.validate(&sky).is_err());

        // Cielo con número impar de azimuts
        let sky_odd = test_sky(25);
        let cfg = TraceConfig::default();
        assert!(cfg.validate(&sky_odd).is_err());
    }
}
