use std::{
    collections::BTreeSet,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    process::Command,
};

use crate::{
    COLUNA_ARQUIVO_ORIGEM, Config, CruzamentoResult, Fontes, ItemDarf, LinhaResumo, Perdcomp,
    RegistroEfd, Resumo, Tabela, total_de_registros,
};

/// Limpar a tela.
pub fn clear_screen(clear_screen: bool) -> CruzamentoResult<()> {
    if clear_screen {
        if cfg!(target_os = "windows") {
            // No Windows, 'cls' é um comando interno do 'cmd'.
            Command::new("cmd").args(["/c", "cls"]).status()?;
        } else {
            Command::new("clear").status()?;
        }
    }

    Ok(())
}

/// Exibe a descrição e a versão do programa.
pub fn imprimir_versao_do_programa() {
    let descr = [
        "Este programa cruza os débitos de PIS e COFINS com os pagamentos e compensações correspondentes.",
        "Débitos: EFD Contribuições (registros M200 e M600) e DCTF (registros R10).",
        "Pagamentos: comprovantes de arrecadação DARF (valor principal de cada item).",
        "Compensações: planilha de PER/DCOMP.",
        "Os valores são somados por período de apuração e por contribuição.",
        "Divergência = valor declarado - (DARF + PER/DCOMP + parcelamentos).",
    ];

    for line in &descr {
        println!(" {}", line);
    }

    println!(
        "\n {}\n versão: {}\n",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
}

pub fn fmt_milhares(n: usize) -> String {
    let s = n.to_string();
    let len = s.len();
    let mut result = String::with_capacity(len + len / 3);

    s.chars().enumerate().for_each(|(i, c)| {
        // Ponto quando a distância até o fim for múltipla de 3
        if i > 0 && (len - i).is_multiple_of(3) {
            result.push('.');
        }
        result.push(c);
    });

    result
}

/// Valor monetário no formato brasileiro: `-1.234.567,89`.
///
/// ```
/// use cruzamento_pis_cofins::fmt_valor;
///
/// assert_eq!(fmt_valor(1234567.891), "1.234.567,89");
/// assert_eq!(fmt_valor(-0.5), "-0,50");
/// assert_eq!(fmt_valor(0.0), "0,00");
/// ```
pub fn fmt_valor(valor: f64) -> String {
    let centavos = (valor.abs() * 100.0).round() as u64;
    let inteiro = usize::try_from(centavos / 100).unwrap_or(usize::MAX);
    let sinal = if valor < 0.0 && centavos > 0 { "-" } else { "" };

    format!("{sinal}{},{:02}", fmt_milhares(inteiro), centavos % 100)
}

/// Valor para exportação CSV: sem separador de milhar, vírgula decimal.
pub fn fmt_valor_csv(valor: f64) -> String {
    let valor = if valor == 0.0 { 0.0 } else { valor };
    format!("{valor:.2}").replace('.', ",")
}

// --- Console ---

pub fn imprimir_carga(fontes: &Fontes) {
    let perdcomp = fontes.perdcomp.as_ref();

    let linhas = [
        ("EFD Contribuições", fontes.lidos.efd.len(), fontes.efd.len(), "registros"),
        (
            "DCTF",
            fontes.lidos.dctf.len(),
            total_de_registros(&fontes.dctf),
            "registros",
        ),
        ("DARF", fontes.lidos.darf.len(), fontes.darf.len(), "itens"),
        (
            "PER/DCOMP",
            usize::from(fontes.lidos.perdcomp.is_some()),
            perdcomp.map_or(0, |p| p.registros.len()),
            "linhas",
        ),
    ];

    println!(" --- Carga das fontes ---");
    for (nome, arquivos, itens, unidade) in linhas {
        println!(
            " {nome:<18} arquivos: {:>5} ; {unidade}: {:>9}",
            fmt_milhares(arquivos),
            fmt_milhares(itens)
        );
    }

    if let Some(perdcomp) = perdcomp {
        println!(
            "\n Planilha <{}>: coluna de período = {:?} ; colunas de valor = {:?} ; coluna de código = {:?}",
            perdcomp.arquivo_origem,
            perdcomp.coluna_periodo,
            perdcomp.colunas_valor,
            perdcomp.coluna_codigo
        );
    }
    println!();
}

/// Período alinhado à esquerda, valores à direita.
fn formatar_linha<'a>(campos: impl Iterator<Item = &'a str>, larguras: &[usize]) -> String {
    campos
        .zip(larguras)
        .enumerate()
        .map(|(j, (campo, &largura))| {
            if j == 0 {
                format!("{campo:<largura$}")
            } else {
                format!("{campo:>largura$}")
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Tabela do resumo no console, uma linha por período.
pub fn imprimir_resumo(resumo: &Resumo) {
    let colunas = Resumo::colunas();

    let celulas: Vec<Vec<String>> = resumo
        .linhas
        .iter()
        .map(|linha| {
            std::iter::once(linha.periodo.clone())
                .chain(linha.valores().into_iter().map(fmt_valor))
                .collect()
        })
        .collect();

    let larguras: Vec<usize> = colunas
        .iter()
        .enumerate()
        .map(|(j, nome)| {
            celulas
                .iter()
                .map(|linha| linha[j].chars().count())
                .chain([nome.chars().count()])
                .max()
                .unwrap_or_default()
        })
        .collect();

    let cabecalho = formatar_linha(colunas.iter().copied(), &larguras);
    let separador = "-".repeat(cabecalho.chars().count());

    println!(" --- Resumo do Cruzamento PIS/COFINS ---\n");
    println!(" {cabecalho}");
    println!(" {separador}");

    for (linha, valores) in resumo.linhas.iter().zip(&celulas) {
        if linha.eh_total() {
            println!(" {separador}");
        }
        println!(
            " {}",
            formatar_linha(valores.iter().map(String::as_str), &larguras)
        );
    }
    println!();
}

// --- Exportação ---

/// Configuração única dos CSV gerados: `;` e linhas de tamanho variável.
fn writer_csv<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_writer(writer)
}

fn criar_writer(path: &Path) -> CruzamentoResult<csv::Writer<BufWriter<File>>> {
    let file = File::create(path)?;
    Ok(writer_csv(BufWriter::new(file)))
}

fn registro_resumo(linha: &LinhaResumo) -> Vec<String> {
    std::iter::once(linha.periodo.clone())
        .chain(linha.valores().into_iter().map(fmt_valor_csv))
        .collect()
}

/// Grava o resumo em CSV (`;`, vírgula decimal).
pub fn escrever_resumo<W: Write>(resumo: &Resumo, writer: W) -> CruzamentoResult<()> {
    let mut wtr = writer_csv(writer);
    gravar_resumo(resumo, &mut wtr)
}

fn gravar_resumo<W: Write>(resumo: &Resumo, wtr: &mut csv::Writer<W>) -> CruzamentoResult<()> {
    wtr.write_record(Resumo::colunas())?;
    for linha in &resumo.linhas {
        wtr.write_record(registro_resumo(linha))?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn exportar_resumo(resumo: &Resumo, path: &Path) -> CruzamentoResult<()> {
    let mut wtr = criar_writer(path)?;
    gravar_resumo(resumo, &mut wtr)?;
    println!(" Resumo gravado em <{}>", path.display());
    Ok(())
}

fn exportar_efd(registros: &[RegistroEfd], path: &Path) -> CruzamentoResult<()> {
    let max_campos = registros.iter().map(|r| r.campos.len()).max().unwrap_or_default();

    let mut wtr = criar_writer(path)?;
    let cabecalho = [COLUNA_ARQUIVO_ORIGEM.to_string(), "Periodo".to_string()]
        .into_iter()
        .chain((0..max_campos).map(|i| format!("Campo{i:02}")));
    wtr.write_record(cabecalho)?;

    for registro in registros {
        let linha = [
            registro.arquivo_origem.as_str(),
            registro.periodo.as_deref().unwrap_or_default(),
        ]
        .into_iter()
        .chain(registro.campos.iter().map(String::as_str));
        wtr.write_record(linha)?;
    }

    wtr.flush()?;
    Ok(())
}

fn exportar_tabela(tabela: &Tabela, path: &Path) -> CruzamentoResult<()> {
    let mut wtr = criar_writer(path)?;
    wtr.write_record(&tabela.colunas)?;

    for registro in &tabela.registros {
        wtr.write_record(tabela.colunas.iter().map(|coluna| registro.get(coluna)))?;
    }

    wtr.flush()?;
    Ok(())
}

fn exportar_darf(itens: &[ItemDarf], path: &Path) -> CruzamentoResult<()> {
    // Cabeçalhos parciais: a união dos campos encontrados em todas as páginas
    let campos_cabecalho: BTreeSet<&str> = itens
        .iter()
        .flat_map(|item| item.cabecalho.keys().map(String::as_str))
        .collect();

    let mut wtr = criar_writer(path)?;
    let colunas_item = [
        "Codigo",
        "DescricaoPrincipal",
        "DescricaoComplementar",
        "PrincipalItem",
        "MultaItem",
        "JurosItem",
        "TotalItem",
        "PeriodoAjustado",
        COLUNA_ARQUIVO_ORIGEM,
    ];
    wtr.write_record(campos_cabecalho.iter().copied().chain(colunas_item))?;

    for item in itens {
        let cabecalho = campos_cabecalho
            .iter()
            .map(|campo| item.cabecalho.get(*campo).map(String::as_str).unwrap_or_default());
        let valores = [
            item.codigo.as_str(),
            item.descricao_principal.as_str(),
            item.descricao_complementar.as_str(),
            item.principal_item.as_str(),
            item.multa_item.as_str(),
            item.juros_item.as_str(),
            item.total_item.as_str(),
            item.periodo_ajustado.as_deref().unwrap_or_default(),
            item.arquivo_origem.as_str(),
        ];
        wtr.write_record(cabecalho.chain(valores))?;
    }

    wtr.flush()?;
    Ok(())
}

fn exportar_perdcomp(perdcomp: &Perdcomp, path: &Path) -> CruzamentoResult<()> {
    let mut wtr = criar_writer(path)?;
    let cabecalho = ["PeriodoOriginal", "Periodo", "Codigo"]
        .into_iter()
        .chain(perdcomp.colunas_valor.iter().map(String::as_str))
        .chain([COLUNA_ARQUIVO_ORIGEM]);
    wtr.write_record(cabecalho)?;

    for registro in &perdcomp.registros {
        let valores = registro
            .valores
            .iter()
            .map(|valor| valor.map(fmt_valor_csv).unwrap_or_default());
        let linha = [
            registro.periodo_original.clone(),
            registro.periodo.clone().unwrap_or_default(),
            registro.codigo.clone().unwrap_or_default(),
        ]
        .into_iter()
        .chain(valores)
        .chain([perdcomp.arquivo_origem.clone()]);
        wtr.write_record(linha)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exporta as tabelas de cada fonte ao lado do resumo.
///
/// Fontes sem dados não geram arquivo. Retorna os caminhos gravados.
pub fn exportar_detalhes(fontes: &Fontes, config: &Config) -> CruzamentoResult<Vec<PathBuf>> {
    let mut gravados = Vec::new();

    if !fontes.efd.is_empty() {
        let path = config.caminho_detalhe("EFD");
        exportar_efd(&fontes.efd, &path)?;
        gravados.push(path);
    }

    for (tipo, tabela) in fontes.dctf.iter().filter(|(_, t)| !t.is_empty()) {
        let path = config.caminho_detalhe(&format!("DCTF-{tipo}"));
        exportar_tabela(tabela, &path)?;
        gravados.push(path);
    }

    if !fontes.darf.is_empty() {
        let path = config.caminho_detalhe("DARF");
        exportar_darf(&fontes.darf, &path)?;
        gravados.push(path);
    }

    if let Some(perdcomp) = fontes.perdcomp.as_ref().filter(|p| !p.registros.is_empty()) {
        let path = config.caminho_detalhe("PERDCOMP");
        exportar_perdcomp(perdcomp, &path)?;
        gravados.push(path);
    }

    for path in &gravados {
        println!(" ---> Tabela de detalhe: <{}>", path.display());
    }

    Ok(gravados)
}
