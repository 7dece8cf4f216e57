use execution_time::ExecutionTime;
use std::process;

use cruzamento_pis_cofins::{
    CruzamentoResult, carregar_fontes, clear_screen, exportar_detalhes, exportar_resumo,
    get_config, imprimir_carga, imprimir_resumo, imprimir_versao_do_programa, iniciar_logger,
};

fn main() {
    // Erro reportado ao usuário final sem stack trace técnico
    if let Err(err) = run() {
        eprintln!("\n[ERRO CRÍTICO]: {err}");
        process::exit(1);
    }
}

fn run() -> CruzamentoResult<()> {
    let timer = ExecutionTime::start();

    // 1. Obter Configurações
    let config = get_config()?;

    // 2. Setup inicial
    clear_screen(config.clear)?;
    iniciar_logger(config.verbose);
    imprimir_versao_do_programa();

    if config.verbose {
        println!("{:#?}\n", config);
    }

    // 3. Carga das fontes (paralela)
    let fontes = carregar_fontes(&config.entradas);
    imprimir_carga(&fontes);

    // 4. Cruzamento por período
    let resumo = fontes.gerar_resumo();
    imprimir_resumo(&resumo);

    // 5. Exportação
    exportar_resumo(&resumo, &config.target)?;

    if config.detalhes {
        exportar_detalhes(&fontes, &config)?;
    }

    println!("\n Cruzamento concluído com sucesso.\n");
    timer.print_elapsed_time();

    Ok(())
}
