use clap::Parser;
use rand::Rng;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    CruzamentoError, CruzamentoResult, EFD_REGISTRO_ABERTURA, RE_RESUMO_GERADO, ler_texto,
};

// Estrutura para o Clap processar os argumentos da linha de comando
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Arguments {
    /// Clear screen
    #[arg(short, long, default_value_t = false)]
    clear: bool,

    /// Arquivo(s) da EFD Contribuições (texto delimitado por `|`).
    #[arg(short, long, num_args = 1..)]
    efd: Vec<PathBuf>,

    /// Arquivo(s) da DCTF (`.dec`, posições fixas).
    #[arg(short, long, num_args = 1..)]
    dctf: Vec<PathBuf>,

    /// Comprovante(s) de arrecadação DARF.
    ///
    /// Arquivos esperados:
    ///
    /// - `.pdf` com camada de texto
    /// - `.txt` com o texto já extraído (páginas separadas por form feed)
    #[arg(short = 'p', long, num_args = 1..)]
    darf: Vec<PathBuf>,

    /// Planilha de PER/DCOMP (`.xlsx`, `.xls`, `.ods` ou `.csv`).
    #[arg(short = 'x', long)]
    perdcomp: Option<PathBuf>,

    /// Diretório pesquisado quando nenhum arquivo de entrada é informado.
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Arquivo CSV do resumo.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Exportar também as tabelas de cada fonte.
    #[arg(long, default_value_t = false)]
    detalhes: bool,

    /// Ativar modo detalhado (verbose)
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

/// Arquivos de cada fonte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArquivosDeEntrada {
    pub efd: Vec<PathBuf>,
    pub dctf: Vec<PathBuf>,
    pub darf: Vec<PathBuf>,
    pub perdcomp: Option<PathBuf>,
}

impl ArquivosDeEntrada {
    pub fn is_empty(&self) -> bool {
        self.efd.is_empty()
            && self.dctf.is_empty()
            && self.darf.is_empty()
            && self.perdcomp.is_none()
    }

    pub fn len(&self) -> usize {
        self.efd.len() + self.dctf.len() + self.darf.len() + usize::from(self.perdcomp.is_some())
    }
}

#[derive(Debug)]
pub struct Config {
    pub clear: bool,
    pub detalhes: bool,
    pub verbose: bool,
    pub entradas: ArquivosDeEntrada,
    pub target: PathBuf,
}

impl Config {
    /// Caminho de uma tabela de detalhe, derivado do arquivo do resumo.
    ///
    /// `resumo.csv` + `DARF` -> `resumo-DARF.csv`
    pub fn caminho_detalhe(&self, fonte: &str) -> PathBuf {
        let stem = self
            .target
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.target.with_file_name(format!("{stem}-{fonte}.csv"))
    }
}

pub fn get_config() -> CruzamentoResult<Config> {
    let args = Arguments::parse();

    let mut entradas = ArquivosDeEntrada {
        efd: args.efd,
        dctf: args.dctf,
        darf: args.darf,
        perdcomp: args.perdcomp,
    };

    // 1. Sem arquivos informados: pesquisar o diretório.
    if entradas.is_empty() {
        entradas = search_input_files(&args.dir)?;

        println!(
            " Arquivo(s) de entrada encontrado(s) no diretório {:?}:\n",
            args.dir
        );
        imprimir_entradas(&entradas);
    }

    // 2. Geração do Target
    let target = args.output.unwrap_or_else(|| {
        let mut rng = rand::rng();
        PathBuf::from(format!(
            "ZZZ-{:06}-Resumo do Cruzamento PIS COFINS.csv",
            rng.random_range(0..999999)
        ))
    });

    Ok(Config {
        clear: args.clear,
        detalhes: args.detalhes,
        verbose: args.verbose,
        entradas,
        target,
    })
}

fn imprimir_entradas(entradas: &ArquivosDeEntrada) {
    let grupos = [
        (TipoDeArquivo::Efd, entradas.efd.as_slice()),
        (TipoDeArquivo::Dctf, entradas.dctf.as_slice()),
        (TipoDeArquivo::Darf, entradas.darf.as_slice()),
        (TipoDeArquivo::Perdcomp, entradas.perdcomp.as_slice()),
    ];

    for (tipo, arquivos) in grupos {
        arquivos.iter().enumerate().for_each(|(i, path)| {
            println!("{:6}: [{tipo}] {}", i + 1, path.display());
        });
    }
    println!();
}

/// Fonte de dados reconhecida pela extensão (e, para `.txt`, pelo conteúdo).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipoDeArquivo {
    Efd,
    Dctf,
    Darf,
    Perdcomp,
}

impl std::fmt::Display for TipoDeArquivo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let nome = match self {
            TipoDeArquivo::Efd => "EFD",
            TipoDeArquivo::Dctf => "DCTF",
            TipoDeArquivo::Darf => "DARF",
            TipoDeArquivo::Perdcomp => "PERDCOMP",
        };
        write!(f, "{nome}")
    }
}

impl TipoDeArquivo {
    pub fn identificar(path: &Path) -> Option<TipoDeArquivo> {
        let extensao = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)?;

        match extensao.as_str() {
            "dec" => Some(TipoDeArquivo::Dctf),
            "pdf" => Some(TipoDeArquivo::Darf),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" | "csv" => Some(TipoDeArquivo::Perdcomp),
            "txt" if eh_efd(path) => Some(TipoDeArquivo::Efd),
            _ => None,
        }
    }
}

/// Arquivo texto cuja primeira linha é o registro de abertura `|0000|`.
fn eh_efd(path: &Path) -> bool {
    let abertura = format!("|{EFD_REGISTRO_ABERTURA}|");
    ler_texto(path)
        .map(|texto| {
            texto
                .lines()
                .next()
                .is_some_and(|linha| linha.starts_with(&abertura))
        })
        .unwrap_or_default()
}

/// Procura arquivos de entrada no diretório, classificando-os pela extensão.
///
/// Os arquivos de cada fonte ficam em ordem alfabética. Apenas a primeira
/// planilha encontrada é usada como PER/DCOMP.
pub fn search_input_files(dir: &Path) -> CruzamentoResult<ArquivosDeEntrada> {
    // 1. Leitura funcional do diretório
    let mut arquivos: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| CruzamentoError::IoReader {
            source: e,
            arquivo: dir.to_path_buf(),
        })?
        .flatten() // Transforma Result<DirEntry> em DirEntry, ignorando erros individuais
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && !eh_resumo_gerado(path))
        .collect();

    // 2. Ordenação (alfabética)
    arquivos.sort();

    // 3. Classificação
    let mut entradas = ArquivosDeEntrada::default();
    for path in arquivos {
        match TipoDeArquivo::identificar(&path) {
            Some(TipoDeArquivo::Efd) => entradas.efd.push(path),
            Some(TipoDeArquivo::Dctf) => entradas.dctf.push(path),
            Some(TipoDeArquivo::Darf) => entradas.darf.push(path),
            Some(TipoDeArquivo::Perdcomp) if entradas.perdcomp.is_none() => {
                entradas.perdcomp = Some(path)
            }
            Some(TipoDeArquivo::Perdcomp) => {
                log::warn!("Planilha {path:?} ignorada: apenas uma planilha de PER/DCOMP é usada.")
            }
            None => {}
        }
    }

    // 4. Validação de existência
    if entradas.is_empty() {
        return Err(CruzamentoError::Config(format!(
            "nenhum arquivo de EFD, DCTF, DARF ou PER/DCOMP encontrado em {dir:?}"
        )));
    }

    Ok(entradas)
}

/// Resumos gerados em execuções anteriores não são entradas.
fn eh_resumo_gerado(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|nome| RE_RESUMO_GERADO.is_match(nome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn classificacao_por_extensao_e_conteudo() {
        let dir = tempfile::tempdir().unwrap();
        let p = |nome: &str| dir.path().join(nome);

        fs::write(p("b.dec"), "R10").unwrap();
        fs::write(p("a.dec"), "R10").unwrap();
        fs::write(p("efd.txt"), "|0000|006|0|||01012024|\n").unwrap();
        fs::write(p("notas.txt"), "texto qualquer\n").unwrap();
        fs::write(p("darf.pdf"), "").unwrap();
        fs::write(p("comp.xlsx"), "").unwrap();
        fs::write(p("outra.ods"), "").unwrap();
        fs::write(p("ZZZ-123456-Resumo do Cruzamento PIS COFINS.csv"), "").unwrap();

        let entradas = search_input_files(dir.path()).unwrap();

        assert_eq!(entradas.dctf, [p("a.dec"), p("b.dec")]);
        assert_eq!(entradas.efd, [p("efd.txt")]);
        assert_eq!(entradas.darf, [p("darf.pdf")]);
        assert_eq!(entradas.perdcomp, Some(p("comp.xlsx")));
        assert_eq!(entradas.len(), 5);
    }

    #[test]
    fn diretorio_sem_entradas() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("leia-me.md"), "").unwrap();

        let err = search_input_files(dir.path()).unwrap_err();
        assert!(matches!(err, CruzamentoError::Config(_)));
    }

    #[test]
    fn caminho_das_tabelas_de_detalhe() {
        let config = Config {
            clear: false,
            detalhes: true,
            verbose: false,
            entradas: ArquivosDeEntrada::default(),
            target: PathBuf::from("saida/resumo.csv"),
        };
        assert_eq!(config.caminho_detalhe("DARF"), PathBuf::from("saida/resumo-DARF.csv"));
    }
}
