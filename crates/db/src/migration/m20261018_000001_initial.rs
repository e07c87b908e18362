//! Initial database migration.
//!
//! Creates the enums, tables, constraints, and triggers of the ledger schema and
//! seeds the default payment methods.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: PARTIES & CATALOG
        // ============================================================
        db.execute_unprepared(CUSTOMERS_SQL).await?;
        db.execute_unprepared(SUPPLIERS_SQL).await?;
        db.execute_unprepared(PRODUCTS_SQL).await?;
        db.execute_unprepared(PAYMENT_METHODS_SQL).await?;

        // ============================================================
        // PART 3: SALES, CHECKS & PAYMENTS
        // ============================================================
        db.execute_unprepared(SALES_SQL).await?;
        db.execute_unprepared(SALE_ITEMS_SQL).await?;
        db.execute_unprepared(CHECKS_SQL).await?;
        db.execute_unprepared(PAYMENTS_SQL).await?;

        // ============================================================
        // PART 4: RUNNING-ACCOUNT LEDGER
        // ============================================================
        db.execute_unprepared(LEDGER_ENTRIES_SQL).await?;

        // ============================================================
        // PART 5: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        // ============================================================
        // PART 6: SEED DATA
        // ============================================================
        db.execute_unprepared(SEED_PAYMENT_METHODS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE entry_kind AS ENUM ('sale_debt', 'payment', 'adjustment');

CREATE TYPE check_state AS ENUM ('pending', 'cleared', 'bounced', 'voided');

CREATE TYPE check_direction AS ENUM ('received', 'issued');

CREATE TYPE payment_status AS ENUM ('pending', 'partial', 'paid');

CREATE TYPE payment_method_kind AS ENUM (
    'cash',
    'transfer',
    'card',
    'check',
    'running_account',
    'other'
);
";

const CUSTOMERS_SQL: &str = r"
CREATE TABLE customers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(200) NOT NULL,
    tax_id VARCHAR(50),
    email VARCHAR(255),
    phone VARCHAR(50),
    address VARCHAR(500),
    credit_limit NUMERIC(14, 2) NOT NULL DEFAULT 0,
    current_balance NUMERIC(14, 2) NOT NULL DEFAULT 0,
    active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_credit_limit_non_negative CHECK (credit_limit >= 0),
    CONSTRAINT chk_balance_non_negative CHECK (current_balance >= 0)
);

CREATE INDEX idx_customers_name ON customers(name);
";

const SUPPLIERS_SQL: &str = r"
CREATE TABLE suppliers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(200) NOT NULL,
    tax_id VARCHAR(50),
    email VARCHAR(255),
    phone VARCHAR(50),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const PRODUCTS_SQL: &str = r"
CREATE TABLE products (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    sku VARCHAR(64) NOT NULL UNIQUE,
    name VARCHAR(200) NOT NULL,
    unit_price NUMERIC(14, 2) NOT NULL,
    stock INTEGER NOT NULL DEFAULT 0,
    active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_unit_price_non_negative CHECK (unit_price >= 0),
    CONSTRAINT chk_stock_non_negative CHECK (stock >= 0)
);
";

const PAYMENT_METHODS_SQL: &str = r"
CREATE TABLE payment_methods (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(100) NOT NULL UNIQUE,
    kind payment_method_kind NOT NULL,
    active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const SALES_SQL: &str = r"
CREATE TABLE sales (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    customer_id UUID NOT NULL REFERENCES customers(id),
    sale_date DATE NOT NULL,
    total NUMERIC(14, 2) NOT NULL,
    payment_status payment_status NOT NULL DEFAULT 'pending',
    notes VARCHAR(1000),
    created_by UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_sale_total_non_negative CHECK (total >= 0)
);

CREATE INDEX idx_sales_customer ON sales(customer_id, sale_date);
";

const SALE_ITEMS_SQL: &str = r"
CREATE TABLE sale_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    sale_id UUID NOT NULL REFERENCES sales(id) ON DELETE CASCADE,
    product_id UUID NOT NULL REFERENCES products(id),
    description VARCHAR(200) NOT NULL,
    quantity INTEGER NOT NULL,
    unit_price NUMERIC(14, 2) NOT NULL,
    line_total NUMERIC(14, 2) NOT NULL,
    CONSTRAINT chk_quantity_positive CHECK (quantity > 0)
);

CREATE INDEX idx_sale_items_sale ON sale_items(sale_id);
";

const CHECKS_SQL: &str = r"
CREATE TABLE checks (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    direction check_direction NOT NULL,
    customer_id UUID REFERENCES customers(id),
    sale_id UUID REFERENCES sales(id),
    supplier_id UUID REFERENCES suppliers(id),
    number VARCHAR(50) NOT NULL,
    bank VARCHAR(100) NOT NULL,
    amount NUMERIC(14, 2) NOT NULL,
    issue_date DATE NOT NULL,
    due_date DATE,
    state check_state NOT NULL DEFAULT 'pending',
    cleared_on DATE,
    state_reason VARCHAR(500),
    notes VARCHAR(1000),
    created_by UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_check_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_check_direction_relations CHECK (
        (direction = 'received' AND customer_id IS NOT NULL AND supplier_id IS NULL)
        OR
        (direction = 'issued' AND supplier_id IS NOT NULL AND customer_id IS NULL AND sale_id IS NULL)
    ),
    CONSTRAINT chk_check_cleared_on CHECK (
        (state = 'cleared') = (cleared_on IS NOT NULL)
    )
);

CREATE INDEX idx_checks_pending_due ON checks(due_date) WHERE state = 'pending';
CREATE INDEX idx_checks_sale ON checks(sale_id);
CREATE INDEX idx_checks_customer ON checks(customer_id);
";

const PAYMENTS_SQL: &str = r"
CREATE TABLE payments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    sale_id UUID NOT NULL REFERENCES sales(id),
    method_id UUID NOT NULL REFERENCES payment_methods(id),
    method_kind payment_method_kind NOT NULL,
    amount NUMERIC(14, 2) NOT NULL,
    payment_date DATE NOT NULL,
    check_id UUID REFERENCES checks(id),
    recorded_by UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_payment_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_payment_check_link CHECK (
        (method_kind = 'check') = (check_id IS NOT NULL)
    )
);

CREATE INDEX idx_payments_sale ON payments(sale_id);
";

const LEDGER_ENTRIES_SQL: &str = r"
CREATE TABLE ledger_entries (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    sequence BIGINT GENERATED ALWAYS AS IDENTITY UNIQUE,
    customer_id UUID NOT NULL REFERENCES customers(id),
    sale_id UUID REFERENCES sales(id),
    kind entry_kind NOT NULL,
    debit NUMERIC(14, 2) NOT NULL DEFAULT 0,
    credit NUMERIC(14, 2) NOT NULL DEFAULT 0,
    entry_date DATE NOT NULL,
    description VARCHAR(500),
    recorded_by UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_debit_or_credit CHECK (
        (debit > 0 AND credit = 0) OR (debit = 0 AND credit > 0)
    ),
    CONSTRAINT chk_sale_debt_shape CHECK (
        kind <> 'sale_debt' OR (sale_id IS NOT NULL AND debit > 0)
    ),
    CONSTRAINT chk_payment_is_credit CHECK (
        kind <> 'payment' OR credit > 0
    )
);

CREATE UNIQUE INDEX uq_ledger_sale_debt ON ledger_entries(sale_id) WHERE kind = 'sale_debt';
CREATE INDEX idx_le_customer ON ledger_entries(customer_id, entry_date, sequence);
CREATE INDEX idx_le_sale ON ledger_entries(sale_id);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: prevent_ledger_mutation
-- Ledger entries are append-only; corrections are new entries
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_ledger_mutation()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'ledger_entries is append-only. Record an offsetting entry instead.';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_ledger_append_only
BEFORE UPDATE OR DELETE ON ledger_entries
FOR EACH ROW
EXECUTE FUNCTION prevent_ledger_mutation();

-- ============================================================
-- FUNCTION: prevent_terminal_check_modification
-- Cleared, bounced and voided checks are immutable
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_terminal_check_modification()
RETURNS TRIGGER AS $$
BEGIN
    IF OLD.state <> 'pending' THEN
        RAISE EXCEPTION 'Check % is % and can no longer change', OLD.id, OLD.state;
    END IF;
    IF NEW.amount <> OLD.amount OR NEW.direction <> OLD.direction THEN
        RAISE EXCEPTION 'Check amount and direction are immutable';
    END IF;
    NEW.updated_at := now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_check_terminal_immutable
BEFORE UPDATE ON checks
FOR EACH ROW
EXECUTE FUNCTION prevent_terminal_check_modification();

-- ============================================================
-- FUNCTION: prevent_sale_total_change
-- A sale's total is fixed at creation
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_sale_total_change()
RETURNS TRIGGER AS $$
BEGIN
    IF NEW.total <> OLD.total OR NEW.customer_id <> OLD.customer_id THEN
        RAISE EXCEPTION 'Sale total and customer are immutable';
    END IF;
    NEW.updated_at := now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_sale_total_immutable
BEFORE UPDATE ON sales
FOR EACH ROW
EXECUTE FUNCTION prevent_sale_total_change();
";

const SEED_PAYMENT_METHODS_SQL: &str = r"
INSERT INTO payment_methods (name, kind) VALUES
    ('Cash', 'cash'),
    ('Bank transfer', 'transfer'),
    ('Card', 'card'),
    ('Check', 'check'),
    ('Running account', 'running_account')
ON CONFLICT (name) DO NOTHING;
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

DROP TRIGGER IF EXISTS trg_sale_total_immutable ON sales;
DROP TRIGGER IF EXISTS trg_check_terminal_immutable ON checks;
DROP TRIGGER IF EXISTS trg_ledger_append_only ON ledger_entries;

DROP FUNCTION IF EXISTS prevent_sale_total_change();
DROP FUNCTION IF EXISTS prevent_terminal_check_modification();
DROP FUNCTION IF EXISTS prevent_ledger_mutation();

DROP TABLE IF EXISTS ledger_entries CASCADE;
DROP TABLE IF EXISTS payments CASCADE;
DROP TABLE IF EXISTS checks CASCADE;
DROP TABLE IF EXISTS sale_items CASCADE;
DROP TABLE IF EXISTS sales CASCADE;
DROP TABLE IF EXISTS payment_methods CASCADE;
DROP TABLE IF EXISTS products CASCADE;
DROP TABLE IF EXISTS suppliers CASCADE;
DROP TABLE IF EXISTS customers CASCADE;

DROP TYPE IF EXISTS payment_method_kind;
DROP TYPE IF EXISTS payment_status;
DROP TYPE IF EXISTS check_direction;
DROP TYPE IF EXISTS check_state;
DROP TYPE IF EXISTS entry_kind;
";
