use std::{fs, path::Path};

use cruzamento_pis_cofins::{
    ArquivosDeEntrada, PisCofins, carregar_fontes, escrever_resumo, search_input_files,
};

const EFD_JANEIRO: &str = "\
|0000|006|0|||01012024|31012024|EMPRESA TESTE LTDA|12345678000199|SP|3550308||00|0|
|0001|0|
|M200|0|0|0|0|0|0|0|0|0|0|0|1.000,00|
|M600|0|0|0|0|0|0|0|0|0|0|0|4.600,00|
|9999|5|
";

const DARF_JANEIRO: &str = "\
Comprovante de Arrecadação dos Tributos Federais
12.345.678/0001-99 EMPRESA TESTE LTDA
Período de Apuração Data de Vencimento Número do Documento
31/01/2024 26/02/2024 07162400000000001
Composição do Documento de Arrecadação
8109 PIS - FATURAMENTO 1.000,00 - - 1.000,00
02 - PIS NAO CUMULATIVO
2172 COFINS 4.600,00 10,00 5,50 4.615,50
01 - COFINS NAO CUMULATIVA
Totais 5.600,00 5,50 10,00 5.615,50
";

const DARF_FEVEREIRO: &str = "\
Comprovante de Arrecadação dos Tributos Federais
12.345.678/0001-99 EMPRESA TESTE LTDA
Período de Apuração Data de Vencimento Número do Documento
29/02/2024 25/03/2024 07162400000000002
Composição do Documento de Arrecadação
8109 PIS - FATURAMENTO 30,00 - - 30,00
02 - PIS NAO CUMULATIVO
Totais 30,00 - - 30,00
";

const PERDCOMP_CSV: &str = "\
periodo_apuracao;cod_receita;valor_principal
02/2024;6912;20,00
";

/// Registro R10 da DCTF em posições fixas.
fn linha_r10(mofg: &str, cod_receita: &str, centavos: u64) -> String {
    format!(
        "R10{:<14}{mofg:<6}{cod_receita:<6}M{:<8}{centavos:014}{:014}",
        "12345678000199", "", 0
    )
}

fn dctf() -> String {
    [
        format!("R01{:<14}{:<6}{:<50}{:<5}", "12345678000199", "202401", "EMPRESA TESTE", "3.8"),
        linha_r10("202401", "810902", 100_000),
        linha_r10("202401", "217201", 460_000),
        linha_r10("202402", "810902", 5_000),
    ]
    .join("\r\n")
}

fn gravar_entradas(dir: &Path) {
    fs::write(dir.join("efd-jan.txt"), EFD_JANEIRO).unwrap();
    fs::write(dir.join("dctf.dec"), dctf()).unwrap();
    fs::write(
        dir.join("darf.txt"),
        format!("{DARF_JANEIRO}\u{c}{DARF_FEVEREIRO}"),
    )
    .unwrap();
    fs::write(dir.join("perdcomp.csv"), PERDCOMP_CSV).unwrap();
}

fn entradas(dir: &Path) -> ArquivosDeEntrada {
    ArquivosDeEntrada {
        efd: vec![dir.join("efd-jan.txt")],
        dctf: vec![dir.join("dctf.dec")],
        darf: vec![dir.join("darf.txt")],
        perdcomp: Some(dir.join("perdcomp.csv")),
    }
}

#[test]
fn cruzamento_completo() {
    let dir = tempfile::tempdir().unwrap();
    gravar_entradas(dir.path());

    let fontes = carregar_fontes(&entradas(dir.path()));
    assert_eq!(fontes.darf.len(), 3);
    assert_eq!(fontes.lidos.len(), 4);

    let resumo = fontes.gerar_resumo();
    let periodos: Vec<&str> = resumo.periodos().iter().map(|l| l.periodo.as_str()).collect();
    assert_eq!(periodos, ["01012024", "01022024"]);

    let jan = resumo.linha("01012024").unwrap();
    assert_eq!(jan.efd, PisCofins { pis: 1000.0, cofins: 4600.0 });
    assert_eq!(jan.dctf, PisCofins { pis: 1000.0, cofins: 4600.0 });
    assert_eq!(jan.darf, PisCofins { pis: 1000.0, cofins: 4600.0 });
    assert_eq!(jan.divergencia_efd, PisCofins::ZERO);
    assert_eq!(jan.divergencia_dctf, PisCofins::ZERO);

    let fev = resumo.linha("01022024").unwrap();
    assert_eq!(fev.efd, PisCofins::ZERO);
    assert_eq!(fev.dctf.pis, 50.0);
    assert_eq!(fev.darf.pis, 30.0);
    assert_eq!(fev.perdcomp.pis, 20.0);
    assert_eq!(fev.perdcomp.cofins, 0.0);
    assert_eq!(fev.divergencia_dctf.pis, 0.0);
    assert_eq!(fev.divergencia_efd.pis, -50.0);

    let total = resumo.total().unwrap();
    assert_eq!(total.dctf.pis, 1050.0);
    assert_eq!(total.darf.cofins, 4600.0);
    assert_eq!(total.divergencia_efd.pis, -50.0);
}

#[test]
fn resumo_exportado() {
    let dir = tempfile::tempdir().unwrap();
    gravar_entradas(dir.path());

    let resumo = carregar_fontes(&entradas(dir.path())).gerar_resumo();

    let mut saida = Vec::new();
    escrever_resumo(&resumo, &mut saida).unwrap();
    let texto = String::from_utf8(saida).unwrap();
    let linhas: Vec<&str> = texto.lines().collect();

    assert_eq!(linhas.len(), 4);
    assert_eq!(linhas[0].split(';').count(), 17);
    assert!(linhas[2].starts_with("01022024;0,00;0,00;50,00;0,00;30,00;0,00;"));
    assert!(linhas[3].starts_with("TOTAL;1000,00;4600,00;1050,00;4600,00;"));
}

#[test]
fn cruzamento_idempotente() {
    let dir = tempfile::tempdir().unwrap();
    gravar_entradas(dir.path());

    let fontes = carregar_fontes(&entradas(dir.path()));
    assert_eq!(fontes.gerar_resumo(), fontes.gerar_resumo());
}

#[test]
fn descoberta_no_diretorio() {
    let dir = tempfile::tempdir().unwrap();
    gravar_entradas(dir.path());

    let encontrados = search_input_files(dir.path()).unwrap();

    // darf.txt não começa com |0000| e não é EFD; comprovantes em texto só pela linha de comando
    assert_eq!(encontrados.efd, [dir.path().join("efd-jan.txt")]);
    assert_eq!(encontrados.dctf, [dir.path().join("dctf.dec")]);
    assert!(encontrados.darf.is_empty());
    assert_eq!(encontrados.perdcomp, Some(dir.path().join("perdcomp.csv")));
}

#[test]
fn fontes_ausentes_resultam_em_total_zerado() {
    let dir = tempfile::tempdir().unwrap();
    let entradas = ArquivosDeEntrada {
        efd: vec![dir.path().join("nao-existe.txt")],
        perdcomp: Some(dir.path().join("nao-existe.xlsx")),
        ..Default::default()
    };

    let resumo = carregar_fontes(&entradas).gerar_resumo();

    assert_eq!(resumo.linhas.len(), 1);
    assert!(resumo.total().unwrap().valores().iter().all(|v| *v == 0.0));
}
