use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    ArquivosDeEntrada, CruzamentoError, CruzamentoResult, Documento, ItemDarf, Perdcomp,
    RegistroEfd, Resumo, TabelasDctf, extrair_itens_darf, gerar_resumo, gerar_tabelas_dctf,
    ler_comprovante_darf, ler_perdcomp, nome_do_arquivo, parse_efds,
};

/// Marca de ordem de bytes que alguns editores gravam no início de arquivos UTF-8.
const BOM: char = '\u{feff}';

/// Lê um arquivo texto como UTF-8; se inválido, decodifica como Windows-1252
/// (superconjunto do Latin-1 usado nos arquivos do SPED e da DCTF).
///
/// O BOM inicial é removido aqui, uma única vez, para todas as fontes.
pub fn ler_texto(path: &Path) -> CruzamentoResult<String> {
    let bytes = fs::read(path).map_err(|e| CruzamentoError::IoReader {
        source: e,
        arquivo: path.to_path_buf(),
    })?;

    let texto = match String::from_utf8(bytes) {
        Ok(texto) => texto,
        Err(e) => {
            let bytes = e.into_bytes();
            let (texto, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            log::debug!("{path:?} decodificado como Windows-1252.");
            texto.into_owned()
        }
    };

    Ok(match texto.strip_prefix(BOM) {
        Some(sem_bom) => sem_bom.to_string(),
        None => texto,
    })
}

pub fn ler_documento(path: &Path) -> CruzamentoResult<Documento> {
    Ok(Documento::new(nome_do_arquivo(path), ler_texto(path)?))
}

/// Dados das quatro fontes, já normalizados.
///
/// Arquivos ilegíveis não interrompem a carga: a fonte correspondente
/// fica vazia (ou ausente, no caso da planilha).
#[derive(Debug, Clone, Default)]
pub struct Fontes {
    pub efd: Vec<RegistroEfd>,
    pub dctf: TabelasDctf,
    pub darf: Vec<ItemDarf>,
    pub perdcomp: Option<Perdcomp>,
    /// Arquivos efetivamente lidos.
    pub lidos: ArquivosDeEntrada,
}

impl Fontes {
    pub fn gerar_resumo(&self) -> Resumo {
        gerar_resumo(&self.efd, &self.dctf, &self.darf, self.perdcomp.as_ref())
    }
}

/// Converte a falha de leitura de um arquivo em aviso; o arquivo não contribui.
fn avisar<T>(path: &Path, resultado: CruzamentoResult<T>) -> Option<T> {
    resultado
        .inspect_err(|e| log::warn!("Arquivo <{}>: {e}", path.display()))
        .ok()
}

/// Lê os arquivos em paralelo, mantendo a ordem recebida.
fn ler_arquivos<T, F>(paths: &[PathBuf], ler: F) -> (Vec<PathBuf>, Vec<T>)
where
    T: Send,
    F: Fn(&Path) -> CruzamentoResult<T> + Sync,
{
    paths
        .par_iter()
        .filter_map(|path| avisar(path, ler(path)).map(|dado| (path.clone(), dado)))
        .collect::<Vec<(PathBuf, T)>>()
        .into_iter()
        .unzip()
}

/// Carrega as fontes em paralelo: as quatro fontes entre si e, dentro de cada
/// fonte, os arquivos entre si.
pub fn carregar_fontes(entradas: &ArquivosDeEntrada) -> Fontes {
    let (((efd_lidos, efd), (dctf_lidos, dctf)), ((darf_lidos, darf), perdcomp)) = rayon::join(
        || {
            rayon::join(
                || ler_arquivos(&entradas.efd, ler_documento),
                || ler_arquivos(&entradas.dctf, ler_documento),
            )
        },
        || {
            rayon::join(
                || ler_arquivos(&entradas.darf, ler_comprovante_darf),
                || {
                    entradas
                        .perdcomp
                        .as_deref()
                        .and_then(|path| avisar(path, ler_perdcomp(path)).map(|p| (path, p)))
                },
            )
        },
    );

    let (perdcomp_lido, perdcomp) = perdcomp.unzip();

    Fontes {
        efd: parse_efds(&efd),
        dctf: gerar_tabelas_dctf(&dctf),
        darf: extrair_itens_darf(&darf),
        perdcomp,
        lidos: ArquivosDeEntrada {
            efd: efd_lidos,
            dctf: dctf_lidos,
            darf: darf_lidos,
            perdcomp: perdcomp_lido.map(Path::to_path_buf),
        },
    }
}
