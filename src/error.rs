use std::{io, path::PathBuf};
use thiserror::Error;

/// Tipo de retorno conveniente para todo o projeto
pub type CruzamentoResult<T> = Result<T, CruzamentoError>;

#[derive(Error, Debug)]
pub enum CruzamentoError {
    #[error("Erro de configuração: {0}")]
    Config(String),

    #[error("Erro no processamento CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error(
        "Extensão de arquivo não suportada!\n\
        Arquivo: {arquivo:?}\n\
        Esperado: {esperado}"
    )]
    ExtensaoNaoSuportada {
        arquivo: PathBuf,
        esperado: &'static str,
    },

    #[error("Erro de I/O: {0}")]
    Io(#[from] io::Error),

    #[error(
        "Arquivo não encontrado!\n\
        Arquivo: {arquivo:?}\n\
        {source}"
    )]
    IoReader {
        #[source]
        source: io::Error,
        arquivo: PathBuf,
    },

    #[error("Falha ao extrair texto do PDF <{arquivo:?}>: {mensagem}")]
    Pdf { arquivo: PathBuf, mensagem: String },

    #[error("Período inválido: <{valor}>")]
    PeriodoInvalido { valor: String },

    #[error("Falha ao ler planilha <{arquivo:?}>: {mensagem}")]
    Planilha { arquivo: PathBuf, mensagem: String },

    #[error("Planilha sem linhas ou sem cabeçalho: <{arquivo:?}>")]
    PlanilhaVazia { arquivo: PathBuf },

    #[error("Valor monetário inválido: <{valor}>")]
    ValorInvalido { valor: String },
}

impl CruzamentoError {
    pub fn valor_invalido(valor: &str) -> Self {
        CruzamentoError::ValorInvalido {
            valor: valor.to_string(),
        }
    }

    pub fn periodo_invalido(valor: &str) -> Self {
        CruzamentoError::PeriodoInvalido {
            valor: valor.to_string(),
        }
    }
}
