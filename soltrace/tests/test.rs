// Copyright (c) 2022-2023 Rafael Villar Burke <pachi@ietcc.csic.es>
// Distributed under the MIT License
// (See acoompanying LICENSE file or a copy at http://opensource.org/licenses/MIT)

use ndarray::Array2;
use sky::{n_sky_patches, patches_per_band, PatchMatrix, SkyDome, HOURS_PER_YEAR};
use soltrace::{
    Geometry, HeightGrid, Orientation, Site, SiteRecord, TraceConfig, TraceResults, Tracer,
};

extern crate env_logger;

// Utilidades para tests ------------------

macro_rules! assert_almost_eq {
    ($a:expr, $b:expr) => {
        assert_almost_eq!($a, $b, 0.001)
    };
    ($a:expr, $b:expr, $c:expr) => {
        if ($a - $b).abs() > $c {
            panic!(
                "assertion failed: `abs(left - right) < {}`, (left: `{}`, right: `{}`)",
                $c, $a, $b
            );
        }
    };
}

// Inicialización para los tests
// El logger solo se activa si es un test y emite diagnósticos si el test falla
// Se debe llamar a esta función al principio de cada test
fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Cielo uniforme de radiancia 1 con m=1 y 24 azimuts
fn uniform_sky() -> SkyDome {
    let rows = n_sky_patches(1) + 2;
    let mtx = PatchMatrix::new(1, Array2::from_elem((rows, HOURS_PER_YEAR), 1.0)).unwrap();
    SkyDome::from_patch_matrix(&mtx, 24).unwrap()
}

/// Cielo con radiancia solo en el primer parche nativo de cada banda (sector este)
fn east_sky() -> SkyDome {
    let rows = n_sky_patches(1) + 2;
    let mut values = Array2::zeros((rows, HOURS_PER_YEAR));
    let mut row = 1; // la primera fila es el suelo
    for band_patches in patches_per_band(1) {
        values.row_mut(row).fill(1.0);
        row += band_patches;
    }
    let mtx = PatchMatrix::new(1, values).unwrap();
    SkyDome::from_patch_matrix(&mtx, 24).unwrap()
}

fn box_record(id: &str, x0: f64, y0: f64, side: f64, height: f32) -> SiteRecord {
    SiteRecord {
        id: id.to_string(),
        height,
        archetype: "residencial".to_string(),
        geometry: Geometry::Polygon(vec![
            [x0, y0],
            [x0 + side, y0],
            [x0 + side, y0 + side],
            [x0, y0 + side],
            [x0, y0],
        ]),
    }
}

/// Un sensor XY por arista: la separación supera la longitud útil de la arista
fn one_sensor_config() -> TraceConfig {
    TraceConfig {
        sensor_spacing: 12.0,
        ..Default::default()
    }
}

/// Recuento de rayos no obstruidos con un recorrido escalar de referencia
///
/// Reproduce el criterio del trazador de forma independiente: avance en pasos
/// de 1 m y obstrucción cuando el ángulo hasta la coronación supera la elevación
fn reference_rad(
    grid: &HeightGrid,
    width: f32,
    length: f32,
    sensor: (f32, f32),
    sensor_height: f32,
    normal_theta: f32,
    config: &TraceConfig,
    azimuth_inc: f32,
    elevations: &[f32],
) -> u32 {
    let az_start = normal_theta - std::f32::consts::FRAC_PI_2 + azimuth_inc / 2.0;
    let mut rad = 0;
    for a in 0..config.n_azimuths {
        let psi = az_start + a as f32 * azimuth_inc;
        let (dx, dy) = (psi.cos(), psi.sin());
        for &el_angle in elevations {
            let mut blocked = false;
            let mut step = 0;
            loop {
                let distance = step as f32 * config.ray_step_size;
                let x = sensor.0 + distance * dx;
                let y = sensor.1 + distance * dy;
                if x <= 0.0
                    || y <= 0.0
                    || x >= width
                    || y >= length
                    || distance > config.max_ray_length
                {
                    break;
                }
                if let Some(h) = grid.height_at(x.floor() as i64, y.floor() as i64) {
                    if (h - sensor_height).atan2(distance) > el_angle {
                        blocked = true;
                        break;
                    }
                }
                step += 1;
            }
            if !blocked {
                rad += 1;
            }
        }
    }
    rad
}

/// Registro de resultados del sensor de planta baja con una orientación dada
fn ground_sensor_rad(results: &TraceResults, building_id: u16, orientation: Orientation) -> u32 {
    results
        .sensors
        .iter()
        .find(|s| s.building_id == building_id && s.orientation == orientation && s.height == 0.0)
        .unwrap()
        .rad
}

// --------------

/// Caja aislada de 10x10x10: ningún rayo queda obstruido y las cuatro fachadas son simétricas
#[test]
fn lone_box_unobstructed() {
    init();

    let site = Site {
        records: vec![box_record("B1", 5.0, 5.0, 10.0, 10.0)],
    };
    let tracer = Tracer::new(&site, uniform_sky(), one_sensor_config()).unwrap();
    let results = tracer.run().unwrap();

    // Un sensor XY por arista y cuatro plantas por columna
    assert_eq!(results.sensors.len(), 16);
    // Con 12 azimuts y 7 elevaciones todos los rayos alcanzan el cielo
    for sensor in &results.sensors {
        assert_eq!(sensor.rad, 12 * 7, "sensor {:?}", sensor);
    }
    // La serie nunca es negativa
    assert!(results.time_series.iter().all(|&v| v >= 0.0));

    // Con cielo uniforme las cuatro fachadas reciben lo mismo
    let ground_totals: Vec<f32> = results
        .sensors
        .iter()
        .filter(|s| s.height == 0.0)
        .map(|s| results.time_series[[s.xyz_sensor_id, 0]])
        .collect();
    assert_eq!(ground_totals.len(), 4);
    let mean = ground_totals.iter().sum::<f32>() / 4.0;
    for total in &ground_totals {
        assert_almost_eq!(total, mean, 1e-4);
    }
}

/// Vecino más alto a 3 m: el sensor de planta baja de la fachada encarada pierde rayos
#[test]
fn taller_neighbor_blocks_rays() {
    init();

    let site = Site {
        records: vec![
            box_record("A", 5.0, 5.0, 10.0, 10.0),
            // Hueco de 3 m entre la fachada este de A y la oeste de B
            box_record("B", 18.0, 5.0, 10.0, 20.0),
        ],
    };
    let config = one_sensor_config();
    let tracer = Tracer::new(&site, uniform_sky(), config.clone()).unwrap();
    let results = tracer.run().unwrap();

    let facing_bottom = ground_sensor_rad(&results, 0, Orientation::E);
    let outward_bottom = ground_sensor_rad(&results, 0, Orientation::W);
    assert!(facing_bottom < 84, "facing rad = {}", facing_bottom);
    assert_eq!(outward_bottom, 84);

    // El sensor superior de la columna encarada ve al menos tanto cielo como el inferior
    let facing_column: Vec<_> = results
        .sensors
        .iter()
        .filter(|s| s.building_id == 0 && s.orientation == Orientation::E)
        .collect();
    assert_eq!(facing_column.len(), 4);
    let top = facing_column
        .iter()
        .max_by(|a, b| a.height.partial_cmp(&b.height).unwrap())
        .unwrap();
    assert!(top.rad >= facing_bottom);

    // El recuento coincide con un recorrido escalar de referencia
    let grid = HeightGrid::from_scene(&tracer.scene);
    // Sensor de la fachada este de A: arista de (15,5) a (15,15), normal +x
    let sensor_loc = (15.0 + 1.5, 5.0 + 0.5);
    let expected = reference_rad(
        &grid,
        tracer.scene.width,
        tracer.scene.length,
        sensor_loc,
        0.0,
        0.0,
        &config,
        tracer.sky.azimuthal_aperture,
        &tracer.elevations,
    );
    assert_eq!(facing_bottom, expected);
}

/// Dos muros paralelos de igual altura encarados: lo de dentro se obstruye, lo de fuera no
#[test]
fn facing_walls_equal_height() {
    init();

    let site = Site {
        records: vec![
            box_record("A", 5.0, 5.0, 10.0, 10.0),
            box_record("B", 18.0, 5.0, 10.0, 10.0),
        ],
    };
    let tracer = Tracer::new(&site, uniform_sky(), one_sensor_config()).unwrap();
    let results = tracer.run().unwrap();

    // Fachadas encaradas: obstruidas a poca elevación
    assert!(ground_sensor_rad(&results, 0, Orientation::E) < 84);
    assert!(ground_sensor_rad(&results, 1, Orientation::W) < 84);
    // Fachadas exteriores: despejadas
    assert_eq!(ground_sensor_rad(&results, 0, Orientation::W), 84);
    assert_eq!(ground_sensor_rad(&results, 1, Orientation::E), 84);
    assert_eq!(ground_sensor_rad(&results, 0, Orientation::N), 84);
    assert_eq!(ground_sensor_rad(&results, 0, Orientation::S), 84);
}

/// Emplazamiento vacío: sin sensores y salida de tamaño cero
#[test]
fn empty_site() {
    init();

    let site = Site::default();
    let tracer = Tracer::new(&site, uniform_sky(), TraceConfig::default()).unwrap();
    let results = tracer.run().unwrap();
    assert!(results.sensors.is_empty());
    assert_eq!(results.time_series.shape(), &[0, HOURS_PER_YEAR]);
}

/// Ningún rayo es paralelo a ninguna arista gracias al desfase de media apertura
#[test]
fn no_ray_parallel_to_edges() {
    init();

    // Caja girada 45º además de la caja axial
    let site = Site {
        records: vec![
            box_record("A", 5.0, 5.0, 10.0, 10.0),
            SiteRecord {
                id: "D".to_string(),
                height: 10.0,
                archetype: "residencial".to_string(),
                geometry: Geometry::Polygon(vec![
                    [40.0, 10.0],
                    [47.0, 3.0],
                    [54.0, 10.0],
                    [47.0, 17.0],
                    [40.0, 10.0],
                ]),
            },
        ],
    };
    let tracer = Tracer::new(&site, uniform_sky(), one_sensor_config()).unwrap();
    for edge in &tracer.scene.edges {
        let edge_theta = edge.slopevec.y.atan2(edge.slopevec.x);
        for az_offset in &tracer.azimuths {
            let psi = az_offset + edge.az_start_angle;
            assert!(
                (psi - edge_theta).sin().abs() > 1e-5,
                "rayo paralelo a la arista {:?}",
                edge.start
            );
        }
    }
}

/// El trazado unificado y el de dos fases producen los mismos resultados
#[test]
fn unified_and_two_phase_agree() {
    init();

    let site = Site {
        records: vec![
            box_record("A", 5.0, 5.0, 10.0, 10.0),
            box_record("B", 18.0, 5.0, 10.0, 20.0),
        ],
    };
    let tracer = Tracer::new(&site, uniform_sky(), one_sensor_config()).unwrap();
    let unified = tracer.run().unwrap();
    let (two_phase, xy_hits) = tracer.run_two_phase().unwrap();

    assert_eq!(unified.sensors.len(), two_phase.sensors.len());
    for (a, b) in unified.sensors.iter().zip(two_phase.sensors.iter()) {
        assert_eq!(a.rad, b.rad, "sensor {}", a.xyz_sensor_id);
    }
    for (a, b) in unified
        .time_series
        .iter()
        .zip(two_phase.time_series.iter())
    {
        assert_almost_eq!(a, b, 1e-6);
    }
    // Las fachadas encaradas registran cruces en la primera fase
    assert!(xy_hits.iter().any(|hits| !hits.is_empty()));
}

/// Alineación de la brújula de extremo a extremo: un cielo brillante al este
/// ilumina las fachadas este y norte y deja a oscuras las oeste y sur
#[test]
fn compass_alignment() {
    init();

    let site = Site {
        records: vec![box_record("B1", 5.0, 5.0, 10.0, 10.0)],
    };
    let tracer = Tracer::new(&site, east_sky(), one_sensor_config()).unwrap();
    let results = tracer.run().unwrap();

    let total_for = |orientation: Orientation| -> f32 {
        results
            .sensors
            .iter()
            .filter(|s| s.orientation == orientation && s.height == 0.0)
            .map(|s| results.time_series.row(s.xyz_sensor_id).sum())
            .sum()
    };
    assert!(total_for(Orientation::E) > 0.0);
    assert!(total_for(Orientation::N) > 0.0);
    assert_almost_eq!(total_for(Orientation::W), 0.0, 1e-6);
    assert_almost_eq!(total_for(Orientation::S), 0.0, 1e-6);
}

/// La traslación del emplazamiento no cambia los resultados
#[test]
fn translation_invariance() {
    init();

    let near = Site {
        records: vec![
            box_record("A", 100.0, 200.0, 10.0, 10.0),
            box_record("B", 113.0, 200.0, 10.0, 20.0),
        ],
    };
    let far = Site {
        records: vec![
            box_record("A", 5000.0, 9000.0, 10.0, 10.0),
            box_record("B", 5013.0, 9000.0, 10.0, 20.0),
        ],
    };
    let near_results = Tracer::new(&near, uniform_sky(), one_sensor_config())
        .unwrap()
        .run()
        .unwrap();
    let far_results = Tracer::new(&far, uniform_sky(), one_sensor_config())
        .unwrap()
        .run()
        .unwrap();
    for (a, b) in near_results.sensors.iter().zip(far_results.sensors.iter()) {
        assert_eq!(a.rad, b.rad);
    }
    for (a, b) in near_results
        .time_series
        .iter()
        .zip(far_results.time_series.iter())
    {
        assert_almost_eq!(a, b, 1e-4);
    }
}

/// La tabla de resultados enlaza sensores, aristas, edificios y arquetipos
#[test]
fn results_table_links() {
    init();

    let mut site = Site {
        records: vec![box_record("A", 5.0, 5.0, 10.0, 10.0)],
    };
    site.records.push(SiteRecord {
        archetype: "oficinas".to_string(),
        ..box_record("B", 40.0, 5.0, 10.0, 6.0)
    });
    let tracer = Tracer::new(&site, uniform_sky(), one_sensor_config()).unwrap();
    let results = tracer.run().unwrap();

    // 4 plantas x 4 aristas + 2 plantas x 4 aristas
    assert_eq!(results.sensors.len(), 16 + 8);
    for sensor in &results.sensors {
        let edge = &tracer.scene.edges[sensor.edge_id];
        assert_eq!(edge.building_id, sensor.building_id);
        assert_eq!(sensor.orientation, edge.orientation);
        let expected_archetype = if sensor.building_id == 0 {
            "residencial"
        } else {
            "oficinas"
        };
        assert_eq!(sensor.archetype, expected_archetype);
    }
    // La tabla se serializa a JSON
    let json = results.sensors_as_json().unwrap();
    assert!(json.contains("\"archetype\": \"oficinas\""));
}
