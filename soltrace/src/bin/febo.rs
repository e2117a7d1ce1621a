// Copyright (c) 2022-2023 Rafael Villar Burke <pachi@ietcc.csic.es>
// Distributed under the MIT License
// (See accompanying LICENSE file or a copy at http://opensource.org/licenses/MIT)

use std::fs::File;
use std::io::prelude::*;
use std::path::Path;
use std::process::exit;

use sky::{PatchMatrix, SkyDome};
use soltrace::{Site, TraceConfig, Tracer};

const APP_TITLE: &str = r#"Febo"#;
const APP_DESCRIPTION: &str = r#"
Copyright (c) 2022-2023 Rafael Villar Burke <pachi@ietcc.csic.es>

Licencia: Publicado bajo licencia MIT.

"#;
const APP_ABOUT: &str =
    r#"Febo - Radiación solar directa sobre fachadas a escala urbana con sombreamiento mutuo."#;

// Funciones auxiliares -----------------------------------------------------------------------

fn writefile<P: AsRef<Path>>(path: P, content: &[u8]) {
    let mut file = File::create(&path)
        .map_err(|e| {
            eprintln!(
                "ERROR: no se ha podido crear el archivo \"{}\": {}",
                path.as_ref().display(),
                e
            );
            exit(exitcode::CANTCREAT);
        })
        .unwrap();
    if let Err(e) = file.write_all(content) {
        eprintln!(
            "ERROR: no se ha podido escribir en el archivo \"{}\": {}",
            path.as_ref().display(),
            e
        );
        exit(exitcode::IOERR);
    }
}

fn readfile<P: AsRef<Path>>(path: P) -> String {
    match std::fs::read_to_string(&path) {
        Ok(data) => data,
        Err(e) => {
            eprintln!(
                "ERROR: no se ha podido leer el archivo \"{}\": {}",
                path.as_ref().display(),
                e
            );
            exit(exitcode::NOINPUT);
        }
    }
}

/// Crea aplicación y detecta opciones seleccionadas
fn start_app_and_get_matches() -> clap::ArgMatches {
    use clap::{Arg, ArgAction};
    clap::Command::new(APP_TITLE)
        .bin_name("febo")
        .version(env!("CARGO_PKG_VERSION"))
        .about(APP_ABOUT)
        .after_help(APP_DESCRIPTION)
        .arg(
            Arg::new("archivo_emplazamiento")
                .required(true)
                .index(1)
                .value_name("ARCHIVO_EMPLAZAMIENTO")
                .help("Tabla GIS de pies de planta en formato JSON"),
        )
        .arg(
            Arg::new("archivo_cielo")
                .required(true)
                .index(2)
                .value_name("ARCHIVO_CIELO")
                .help("Matriz de cielo en formato binario (ver skyconv)"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("ARCHIVO_OPCIONES")
                .help("Opciones del trazador en formato JSON"),
        )
        .arg(
            Arg::new("salida")
                .short('o')
                .long("salida")
                .value_name("DIRECTORIO")
                .default_value(".")
                .help("Directorio donde guardar los resultados"),
        )
        .arg(
            Arg::new("dos_fases")
                .long("dos-fases")
                .action(ArgAction::SetTrue)
                .help("Usa el trazado en dos fases (depuración)"),
        )
        .arg(
            Arg::new("v")
                .short('v')
                .action(ArgAction::Count)
                .help("Nivel de detalle de los mensajes de diagnóstico"),
        )
        .get_matches()
}

fn main() {
    let matches = start_app_and_get_matches();

    let log_level = match matches.get_count("v") {
        0 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Emplazamiento
    let site_path = matches.get_one::<String>("archivo_emplazamiento").unwrap();
    let site = match Site::from_json(&readfile(site_path)) {
        Ok(site) => site,
        Err(e) => {
            eprintln!("ERROR: emplazamiento inválido: {}", e);
            exit(exitcode::DATAERR);
        }
    };

    // Opciones del trazador
    let config: TraceConfig = match matches.get_one::<String>("config") {
        Some(path) => match serde_json::from_str(&readfile(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR: opciones inválidas: {}", e);
                exit(exitcode::DATAERR);
            }
        },
        None => TraceConfig::default(),
    };

    // Cielo: la matriz de parches trae su factor de subdivisión y el número de
    // azimuts del cielo es el doble de los del trazador
    let sky_path = matches.get_one::<String>("archivo_cielo").unwrap();
    let sky = PatchMatrix::load(sky_path)
        .and_then(|mtx| SkyDome::from_patch_matrix(&mtx, 2 * config.n_azimuths));
    let sky = match sky {
        Ok(sky) => sky,
        Err(e) => {
            eprintln!("ERROR: no se ha podido preparar el cielo: {}", e);
            exit(exitcode::DATAERR);
        }
    };

    // Cálculo
    let tracer = match Tracer::new(&site, sky, config) {
        Ok(tracer) => tracer,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            exit(exitcode::DATAERR);
        }
    };
    let results = if matches.get_flag("dos_fases") {
        tracer.run_two_phase().map(|(results, _)| results)
    } else {
        tracer.run()
    };
    let results = match results {
        Ok(results) => results,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            exit(exitcode::SOFTWARE);
        }
    };

    // Salida
    let out_dir = Path::new(matches.get_one::<String>("salida").unwrap());
    if let Err(e) = std::fs::create_dir_all(out_dir) {
        eprintln!(
            "ERROR: no se ha podido crear el directorio \"{}\": {}",
            out_dir.display(),
            e
        );
        exit(exitcode::CANTCREAT);
    }
    let sensors_json = match results.sensors_as_json() {
        Ok(json) => json,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            exit(exitcode::SOFTWARE);
        }
    };
    writefile(out_dir.join("sensors.json"), sensors_json.as_bytes());
    if let Err(e) = results.save_time_series(out_dir.join("timeseries.bin")) {
        eprintln!("ERROR: {}", e);
        exit(exitcode::CANTCREAT);
    }

    println!(
        "Calculados {} sensores, resultados en \"{}\"",
        results.sensors.len(),
        out_dir.display()
    );
}
