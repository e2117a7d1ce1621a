// Copyright (c) 2022-2023 Rafael Villar Burke <pachi@ietcc.csic.es>
// Distributed under the MIT License
// (See acoompanying LICENSE file or a copy at http://opensource.org/licenses/MIT)

//! Motor de trazado: escena, malla de alturas, sensores, rayos y acumulación
//!
//! El cálculo avanza por etapas con una barrera entre cada una:
//! construcción de escena -> rasterización -> sensores -> trazado -> acumulación.
//! La malla de alturas y la máscara de visibilidad se escriben en una etapa y
//! solo se leen en la siguiente

mod accumulate;
mod grid;
mod mask;
mod raycast;
mod scene;
pub(crate) mod sensors;

pub use grid::HeightGrid;
pub use mask::VisibilityMask;
pub use raycast::{cast_ray, Hit};
pub use scene::Scene;

use anyhow::{bail, Error};
use log::info;
use sky::SkyDome;

use crate::config::TraceConfig;
use crate::results::TraceResults;
use crate::types::Site;

/// Número máximo de rayos de una escena
const MAX_RAYS: u64 = 1 << 32;

/// Variante de trazado
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TraceMode {
    /// Una sola pasada por rayo (sensor XYZ, azimut, elevación)
    Unified,
    /// Lista de cruces por rayo XY y filtrado posterior por elevación
    ///
    /// Más costosa en memoria; útil para depurar y visualizar primeros impactos
    TwoPhase,
}

/// Motor de cálculo de radiación directa de cielo sobre fachadas
pub struct Tracer {
    /// Escena de cálculo
    pub scene: Scene,
    /// Cielo en subdivisión de paralelos y meridianos
    pub sky: SkyDome,
    /// Opciones del trazador
    pub config: TraceConfig,
    /// Desfases azimutales respecto al primer rayo de cada arista [rad]
    pub azimuths: Vec<f32>,
    /// Elevaciones trazadas (centros de banda del cielo) [rad]
    pub elevations: Vec<f32>,
}

impl Tracer {
    /// Prepara el motor validando las opciones y construyendo la escena
    pub fn new(site: &Site, sky: SkyDome, config: TraceConfig) -> Result<Self, Error> {
        config.validate(&sky)?;

        info!("Construyendo la escena...");
        let scene = Scene::build(site, &config, sky.azimuthal_aperture)?;

        let azimuths: Vec<f32> = (0..config.n_azimuths)
            .map(|a| a as f32 * sky.azimuthal_aperture)
            .collect();
        let elevations = sky.elevation_centers.clone();

        Ok(Self {
            scene,
            sky,
            config,
            azimuths,
            elevations,
        })
    }

    /// Ejecuta el cálculo completo con el trazado unificado
    pub fn run(&self) -> Result<TraceResults, Error> {
        let (results, _) = self.run_mode(TraceMode::Unified)?;
        Ok(results)
    }

    /// Ejecuta el cálculo en dos fases, devolviendo además los cruces por rayo XY
    pub fn run_two_phase(&self) -> Result<(TraceResults, Vec<Vec<Hit>>), Error> {
        let (results, hits) = self.run_mode(TraceMode::TwoPhase)?;
        Ok((results, hits.unwrap_or_default()))
    }

    /// Etapas del cálculo, con la variante de trazado indicada
    fn run_mode(&self, mode: TraceMode) -> Result<(TraceResults, Option<Vec<Vec<Hit>>>), Error> {
        let scene = &self.scene;

        info!("Poblando la malla de alturas...");
        let grid = HeightGrid::from_scene(scene);
        info!("Celdas activas: {}", grid.active_count());

        info!("Posicionando sensores...");
        let (xy_sensors, mut xyz_sensors) = sensors::layout_sensors(scene, &self.config);
        info!("Sensores XY: {}", xy_sensors.len());
        info!("Sensores XYZ: {}", xyz_sensors.len());

        let n_rays = xyz_sensors.len() as u64
            * self.config.n_azimuths as u64
            * self.sky.n_elevations as u64;
        if n_rays >= MAX_RAYS {
            bail!(
                "La escena requiere {} rayos y el máximo admitido es 2^32",
                n_rays
            );
        }
        info!("Rayos XYZ: {}", n_rays);

        let mut mask = VisibilityMask::new(
            xyz_sensors.len(),
            self.config.n_azimuths,
            self.sky.n_elevations,
        );
        let mut xy_hits = None;
        match mode {
            TraceMode::Unified => {
                info!("Trazando rayos (pasada unificada)...");
                raycast::trace_unified(
                    scene,
                    &grid,
                    &self.config,
                    &self.azimuths,
                    &self.elevations,
                    &xy_sensors,
                    &mut xyz_sensors,
                    &mut mask,
                );
            }
            TraceMode::TwoPhase => {
                info!("Trazando rayos XY (primera fase)...");
                let hits = raycast::trace_xy_hits(
                    scene,
                    &grid,
                    &self.config,
                    &self.azimuths,
                    &xy_sensors,
                );
                info!("Filtrando cruces por elevación (segunda fase)...");
                raycast::trace_two_phase(
                    &self.azimuths,
                    &self.elevations,
                    &mut xyz_sensors,
                    &hits,
                    &mut mask,
                );
                xy_hits = Some(hits);
            }
        }

        info!("Acumulando irradiancia por hora...");
        let time_series = accumulate::accumulate_timesteps(
            scene,
            &self.sky,
            &self.azimuths,
            &xy_sensors,
            &xyz_sensors,
            &mask,
        );

        info!("Ensamblando resultados...");
        let results = TraceResults::assemble(scene, &xy_sensors, &xyz_sensors, time_series);
        Ok((results, xy_hits))
    }
}
