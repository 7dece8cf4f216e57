use log::{Level, LevelFilter, Log, Metadata, Record};

/// Mensagens de diagnóstico em stderr, separadas dos relatórios em stdout.
struct LoggerStderr;

static LOGGER: LoggerStderr = LoggerStderr;

impl Log for LoggerStderr {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let rotulo = match record.level() {
            Level::Error => "ERRO",
            Level::Warn => "AVISO",
            Level::Info => "INFO",
            Level::Debug | Level::Trace => "DEBUG",
        };

        eprintln!(" [{rotulo}] {}", record.args());
    }

    fn flush(&self) {}
}

/// Nível `Debug` no modo detalhado, `Warn` caso contrário.
pub fn nivel_do_log(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

/// Instala o logger; chamadas repetidas apenas ajustam o nível.
pub fn iniciar_logger(verbose: bool) {
    // set_logger falha somente se já houver um logger instalado
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(nivel_do_log(verbose));
}
